//! Streams a JSON array into a response body one element at a time, so
//! the body is only produced as fast as the client reads it.

use axum::body::{Body, Bytes};
use futures_util::stream::{self, Stream, StreamExt};
use serde::Serialize;
use service::ServiceError;
use tracing::error;

/// Encode `items` as `[a,b,...]`. An error item aborts the body; the client
/// sees a truncated response rather than a well-formed partial array.
pub fn json_array<T, S>(items: S) -> impl Stream<Item = Result<Bytes, ServiceError>> + Send + 'static
where
    T: Serialize + Send + 'static,
    S: Stream<Item = Result<T, ServiceError>> + Send + 'static,
{
    let open = stream::once(async { Ok(Bytes::from_static(b"[")) });
    let elements = items.enumerate().map(|(i, item)| -> Result<Bytes, ServiceError> {
        let value = item.inspect_err(|e| error!(err = %e, "list stream failed mid-response"))?;
        let mut buf = if i == 0 { Vec::new() } else { vec![b','] };
        serde_json::to_writer(&mut buf, &value).map_err(ServiceError::storage)?;
        Ok(Bytes::from(buf))
    });
    let close = stream::once(async { Ok(Bytes::from_static(b"]")) });
    open.chain(elements).chain(close)
}

pub fn json_array_body<T, S>(items: S) -> Body
where
    T: Serialize + Send + 'static,
    S: Stream<Item = Result<T, ServiceError>> + Send + 'static,
{
    Body::from_stream(json_array(items))
}
