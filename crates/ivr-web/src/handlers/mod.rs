pub mod operator_ws;
