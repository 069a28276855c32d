use crate::client::RelayBody;
use hyper::Response;
use shared::http::filter_hop_by_hop;

/// Turns a backend response into the response sent back to the caller.
///
/// Status and every end-to-end header value are carried over in order,
/// repeated header names included. Hop-by-hop headers belong to the backend
/// connection and are left for the server to set. The body is passed through
/// as a stream without being read here.
pub fn relay_response(upstream: Response<RelayBody>) -> Response<RelayBody> {
    let (mut upstream_parts, body) = upstream.into_parts();
    filter_hop_by_hop(&mut upstream_parts.headers, upstream_parts.version);

    let mut response = Response::new(body);
    *response.status_mut() = upstream_parts.status;

    let headers = response.headers_mut();
    for (name, value) in upstream_parts.headers.iter() {
        headers.append(name, value.clone());
    }

    response
}
