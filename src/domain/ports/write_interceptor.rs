//! Write Interceptor Port
//!
//! Extension point invoked before a document write reaches the store.

use crate::domain::entities::{DocumentData, GeoDocument};
use crate::domain::value_objects::Collection;
use async_trait::async_trait;

/// Kind of write being intercepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Create,
    Update,
}

/// Hook run on the payload of every create/update before persistence.
///
/// Interceptors may modify the payload but cannot fail the write; any
/// problem must be logged and the payload passed on.
///
/// `existing` is the stored document for updates and `None` for creates.
/// Update payloads are partial, so fields absent from `data` keep the
/// values found there.
#[async_trait]
pub trait WriteInterceptor: Send + Sync {
    async fn before_write(
        &self,
        collection: Collection,
        kind: WriteKind,
        data: &mut DocumentData,
        existing: Option<&GeoDocument>,
    );
}
