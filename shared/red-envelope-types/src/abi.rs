//! Solidity ABI of the deployed Red Envelope contract.
//!
//! The contract is an immutable external collaborator: these bindings must match the
//! deployed bytecode exactly, since event topics and calldata are derived from them.

use alloy_sol_types::sol;

sol! {
    interface IRedEnvelope {
        /// One claimed share of an envelope.
        #[derive(Debug, PartialEq, Eq)]
        struct Record {
            address receiver;
            uint256 amount;
        }

        /// Emitted once per `create`.
        #[derive(Debug, PartialEq, Eq)]
        event Create(uint256 indexed id, address indexed sender, address[] receivers, uint256 amount);

        /// Emitted once per successful `grab`.
        #[derive(Debug, PartialEq, Eq)]
        event Receive(uint256 indexed id, address indexed receiver, uint256 amount);

        function create(address[] receivers, uint8 envelopeType) external payable;
        function grab(uint256 id) external;
        function getRecord(uint256 id) external view returns (Record[] memory);
    }
}
