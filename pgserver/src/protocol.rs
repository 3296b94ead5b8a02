//! Wire protocol
//!
//! Request/response messages exchanged with clients over TCP.
//!
//! # Frame layout
//!
//! ```text
//! [4-byte big-endian length header][JSON message data]
//! ```
//!
//! One request maps to one database operation and produces exactly one
//! response frame. Error responses carry the failure message only; no
//! backtraces cross the wire.

use anyhow::{anyhow, Result};
use pgcore::service::db::{
    ColumnSchema, ColumnSpec, QueryParams, QueryRow, DEFAULT_ROW_LIMIT,
};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

/// Upper bound on a single frame. Anything larger is a protocol violation.
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

fn default_limit() -> Option<u64> {
    Some(DEFAULT_ROW_LIMIT)
}

/// Client request, one variant per database operation.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum DbRequest {
    /// List every table in the public schema
    GetTables,

    /// Describe the columns of one table
    GetTableSchema { table_name: String },

    /// Execute a raw SQL query and return its rows
    ExecuteQuery { query: String },

    /// Filtered select. A missing `limit` field defaults to the row cap;
    /// an explicit `"limit": null` asks for an unbounded result set.
    SelectData {
        table_name: String,
        columns: Option<Vec<String>>,
        condition: Option<String>,
        condition_params: Option<Vec<serde_json::Value>>,
        order_by: Option<String>,
        #[serde(default = "default_limit")]
        limit: Option<u64>,
    },

    /// Insert one row
    InsertData {
        table_name: String,
        data: QueryParams,
    },

    /// Update rows matching the condition
    UpdateData {
        table_name: String,
        data: QueryParams,
        condition: String,
        condition_params: Vec<serde_json::Value>,
    },

    /// Delete rows matching the condition
    DeleteData {
        table_name: String,
        condition: String,
        condition_params: Vec<serde_json::Value>,
    },

    /// Create a table from column definitions
    CreateTable {
        table_name: String,
        columns: Vec<ColumnSpec>,
    },

    /// Drop a table
    DropTable { table_name: String },

    /// Probe database connectivity
    HealthCheck,
}

/// Server response, mirroring the operation result shapes.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum DbResponse {
    /// Table name listing
    Tables { tables: Vec<String> },

    /// Table schema description
    TableSchema { columns: Vec<ColumnSchema> },

    /// Result rows from a query or select
    Rows { rows: Vec<QueryRow> },

    /// The single row produced by an insert
    Row { row: QueryRow },

    /// Update summary
    Updated {
        rows_updated: u64,
        updated_data: Vec<QueryRow>,
    },

    /// Delete summary
    Deleted {
        rows_deleted: u64,
        deleted_data: Vec<QueryRow>,
    },

    /// Generic success acknowledgement
    Ack { message: String },

    /// Health probe result
    Health { healthy: bool },

    /// Request-level failure
    Error { message: String },
}

/// Length-prefixed JSON framing, shared by both message types.
macro_rules! impl_framing {
    ($ty:ident) => {
        impl $ty {
            /// Serializes the message into a length-prefixed frame.
            pub fn to_bytes(&self) -> Result<Vec<u8>> {
                let json = serde_json::to_string(self)?;
                let data = json.as_bytes();

                if data.len() > MAX_MESSAGE_SIZE {
                    return Err(anyhow!("message too large: {} bytes", data.len()));
                }

                let length = data.len() as u32;
                let mut result = Vec::with_capacity(4 + data.len());
                result.extend_from_slice(&length.to_be_bytes());
                result.extend_from_slice(data);

                Ok(result)
            }

            /// Deserializes a message from a length-prefixed frame.
            pub fn from_bytes(data: &[u8]) -> Result<Self> {
                if data.len() < 4 {
                    return Err(anyhow!("message is too short"));
                }

                let length = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;

                if length > MAX_MESSAGE_SIZE {
                    return Err(anyhow!("message too large: {} bytes", length));
                }
                if data.len() < 4 + length {
                    return Err(anyhow!("message length does not match header"));
                }

                let json_str = std::str::from_utf8(&data[4..4 + length])?;
                Ok(serde_json::from_str(json_str)?)
            }

            /// Reads one message from a TCP stream.
            pub async fn read_from_stream(
                stream: &mut BufReader<OwnedReadHalf>,
            ) -> Result<Self> {
                let mut length_bytes = [0u8; 4];
                stream.read_exact(&mut length_bytes).await?;
                let length = u32::from_be_bytes(length_bytes) as usize;

                if length > MAX_MESSAGE_SIZE {
                    return Err(anyhow!("message too large: {} bytes", length));
                }

                let mut buffer = vec![0u8; length];
                stream.read_exact(&mut buffer).await?;

                let json_str = std::str::from_utf8(&buffer)?;
                Ok(serde_json::from_str(json_str)?)
            }

            /// Writes one message to a TCP stream.
            pub async fn write_to_stream(
                &self,
                stream: &mut BufWriter<OwnedWriteHalf>,
            ) -> Result<()> {
                let data = self.to_bytes()?;
                stream.write_all(&data).await?;
                stream.flush().await?;
                Ok(())
            }
        }
    };
}

impl_framing!(DbRequest);
impl_framing!(DbResponse);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_round_trips_through_the_frame() {
        let request = DbRequest::GetTableSchema {
            table_name: "users".to_string(),
        };
        let bytes = request.to_bytes().unwrap();
        let decoded = DbRequest::from_bytes(&bytes).unwrap();

        match decoded {
            DbRequest::GetTableSchema { table_name } => assert_eq!(table_name, "users"),
            other => panic!("unexpected request: {:?}", other),
        }
    }

    #[test]
    fn response_round_trips_through_the_frame() {
        let response = DbResponse::Updated {
            rows_updated: 2,
            updated_data: Vec::new(),
        };
        let bytes = response.to_bytes().unwrap();
        let decoded = DbResponse::from_bytes(&bytes).unwrap();

        assert!(matches!(decoded, DbResponse::Updated { rows_updated: 2, .. }));
    }

    #[test]
    fn truncated_frame_is_rejected() {
        let request = DbRequest::GetTables;
        let mut bytes = request.to_bytes().unwrap();
        bytes.truncate(bytes.len() - 1);

        assert!(DbRequest::from_bytes(&bytes).is_err());
    }

    #[test]
    fn oversized_length_header_is_rejected() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(MAX_MESSAGE_SIZE as u32 + 1).to_be_bytes());
        bytes.extend_from_slice(b"{}");

        assert!(DbRequest::from_bytes(&bytes).is_err());
    }

    #[test]
    fn select_without_limit_defaults_to_the_row_cap() {
        let payload = json!({
            "SelectData": { "table_name": "users" }
        })
        .to_string();
        let request: DbRequest = serde_json::from_str(&payload).unwrap();

        match request {
            DbRequest::SelectData { limit, .. } => assert_eq!(limit, Some(DEFAULT_ROW_LIMIT)),
            other => panic!("unexpected request: {:?}", other),
        }
    }

    #[test]
    fn select_with_null_limit_is_unbounded() {
        let payload = json!({
            "SelectData": { "table_name": "users", "limit": null }
        })
        .to_string();
        let request: DbRequest = serde_json::from_str(&payload).unwrap();

        match request {
            DbRequest::SelectData { limit, .. } => assert_eq!(limit, None),
            other => panic!("unexpected request: {:?}", other),
        }
    }
}
