//! Integration tests for the frame message bridge

mod config_loading;
mod frame_lifecycle;
mod origin_admission;
mod request_response;
mod test_utils;
