mod value_network;

pub use value_network::{Activation, DenseLayer, ValueNetwork, ValueNetworkConfig};
pub(crate) use value_network::tensor_to_vec;
