pub mod rpc;

pub use rpc::{load_operator_wallet, ChainClients};
