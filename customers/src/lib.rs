pub mod creator;
pub mod executable_utils;
pub mod lifecycle;
pub mod model;
pub mod storage;
