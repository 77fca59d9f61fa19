//! Type-state markers for the client connection.

/// Marker type for the not-authenticated state.
#[derive(Debug, Clone, Copy)]
pub struct NotAuthenticated;

/// Marker type for the authenticated state.
#[derive(Debug, Clone, Copy)]
pub struct Authenticated;

/// Marker type for the selected state.
#[derive(Debug, Clone, Copy)]
pub struct Selected;

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn markers_are_send_sync() {
        assert_send_sync::<NotAuthenticated>();
        assert_send_sync::<Authenticated>();
        assert_send_sync::<Selected>();
    }
}
