//! HTTP surface: one route per provider in front of the `ProxyEngine`.

mod proxy;

pub use proxy::{REQUEST_ID_HEADER, ProxyState, proxy_router};
