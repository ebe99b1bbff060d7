pub mod decode_log;
