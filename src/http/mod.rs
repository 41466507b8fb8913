//! HTTP 传输模块
//!
//! 提供访问 Jenkins 控制 API 的传输层抽象及其 reqwest 实现

mod client_factory;
#[cfg(test)]
pub(crate) mod testing;
mod transport;

pub use client_factory::{ClientError, HttpClientFactory, ReqwestTransport};
pub use transport::{
    ApiRequest, ApiResponse, BodyStream, ByteStream, RequestBody, StreamingResponse, Transport,
};
