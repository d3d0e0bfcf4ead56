pub(crate) mod support;

mod client_wire;
