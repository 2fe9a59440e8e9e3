//! Backend data source port.

use async_trait::async_trait;

use super::BackendError;
use crate::ids::RecordId;
use crate::location::ProcedureRef;
use crate::record::RecordRef;

/// One backend request issued by the source fetcher.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordQuery {
    /// Constrained retrieval of an entity's records.
    Constraint {
        entity: String,
        constraint: String,
        anchor: Option<RecordRef>,
    },
    /// Named procedure returning records of `entity`.
    Procedure {
        entity: String,
        procedure: ProcedureRef,
        /// Entity of the procedure's input parameter, when it takes the anchor.
        input_parameter_entity: Option<String>,
        anchor: Option<RecordRef>,
    },
}

impl RecordQuery {
    pub fn entity(&self) -> &str {
        match self {
            RecordQuery::Constraint { entity, .. } | RecordQuery::Procedure { entity, .. } => entity,
        }
    }
}

/// Opaque asynchronous record store of the host platform.
#[async_trait]
pub trait DataSourcePort: Send + Sync {
    async fn query_records(&self, query: RecordQuery) -> Result<Vec<RecordRef>, BackendError>;

    /// Current state of one record, `None` once it no longer exists.
    ///
    /// 按 id 读取记录的最新状态。
    async fn get_record(&self, id: &RecordId) -> Result<Option<RecordRef>, BackendError>;
}
