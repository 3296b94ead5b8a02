//! Request handling
//!
//! Per-connection loop translating protocol requests into facade calls,
//! one database operation per request.

use crate::protocol::{DbRequest, DbResponse};
use anyhow::Result;
use pgcore::service::db::{Condition, DbService, DbServiceImpl, SelectOptions};
use pgcore::tool::error::AppError;
use std::sync::Arc;
use tokio::io::{BufReader, BufWriter};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

/// Connection handler dispatching requests against the database service
pub struct RequestHandler {
    service: Arc<DbServiceImpl>,
}

impl RequestHandler {
    /// Creates a new request handler.
    pub fn new(service: Arc<DbServiceImpl>) -> Self {
        Self { service }
    }

    /// Serves one client connection until it disconnects.
    pub async fn handle_connection(&self, stream: TcpStream, addr: String) -> Result<()> {
        let (read_half, write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);
        let mut writer = BufWriter::new(write_half);

        loop {
            let request = match DbRequest::read_from_stream(&mut reader).await {
                Ok(request) => request,
                Err(e) => {
                    if is_disconnect(&e) {
                        debug!("Client {} disconnected", addr);
                    } else {
                        warn!("Failed to read request from {}: {}", addr, e);
                    }
                    break;
                }
            };

            let response = self.dispatch(request).await;
            response.write_to_stream(&mut writer).await?;
        }

        info!("Connection closed: {}", addr);
        Ok(())
    }

    /// Maps one request onto one facade operation.
    pub async fn dispatch(&self, request: DbRequest) -> DbResponse {
        match request {
            DbRequest::GetTables => match self.service.get_tables().await {
                Ok(tables) => DbResponse::Tables { tables },
                Err(e) => error_response("get_tables", e),
            },

            DbRequest::GetTableSchema { table_name } => {
                match self.service.get_table_schema(&table_name).await {
                    Ok(columns) => DbResponse::TableSchema { columns },
                    Err(e) => error_response("get_table_schema", e),
                }
            }

            DbRequest::ExecuteQuery { query } => match self.service.execute_query(&query).await {
                Ok(rows) => DbResponse::Rows { rows },
                Err(e) => error_response("execute_query", e),
            },

            DbRequest::SelectData {
                table_name,
                columns,
                condition,
                condition_params,
                order_by,
                limit,
            } => {
                let options = SelectOptions {
                    columns,
                    condition: condition.map(|clause| Condition {
                        clause,
                        params: condition_params.unwrap_or_default(),
                    }),
                    order_by,
                    limit,
                };

                match self.service.select_rows(&table_name, options).await {
                    Ok(rows) => DbResponse::Rows { rows },
                    Err(e) => error_response("select_data", e),
                }
            }

            DbRequest::InsertData { table_name, data } => {
                match self.service.insert_row(&table_name, data).await {
                    Ok(Some(row)) => DbResponse::Row { row },
                    Ok(None) => DbResponse::Ack {
                        message: "Data inserted".to_string(),
                    },
                    Err(e) => error_response("insert_data", e),
                }
            }

            DbRequest::UpdateData {
                table_name,
                data,
                condition,
                condition_params,
            } => {
                let condition = Condition {
                    clause: condition,
                    params: condition_params,
                };

                match self.service.update_rows(&table_name, data, condition).await {
                    Ok(outcome) => DbResponse::Updated {
                        rows_updated: outcome.rows_updated,
                        updated_data: outcome.updated_data,
                    },
                    Err(e) => error_response("update_data", e),
                }
            }

            DbRequest::DeleteData {
                table_name,
                condition,
                condition_params,
            } => {
                let condition = Condition {
                    clause: condition,
                    params: condition_params,
                };

                match self.service.delete_rows(&table_name, condition).await {
                    Ok(outcome) => DbResponse::Deleted {
                        rows_deleted: outcome.rows_deleted,
                        deleted_data: outcome.deleted_data,
                    },
                    Err(e) => error_response("delete_data", e),
                }
            }

            DbRequest::CreateTable {
                table_name,
                columns,
            } => match self.service.create_table(&table_name, &columns).await {
                Ok(()) => DbResponse::Ack {
                    message: format!("Table '{}' created successfully", table_name),
                },
                Err(e) => error_response("create_table", e),
            },

            DbRequest::DropTable { table_name } => {
                match self.service.drop_table(&table_name).await {
                    Ok(()) => DbResponse::Ack {
                        message: format!("Table '{}' dropped successfully", table_name),
                    },
                    Err(e) => error_response("drop_table", e),
                }
            }

            DbRequest::HealthCheck => match self.service.health_check().await {
                Ok(healthy) => DbResponse::Health { healthy },
                Err(e) => error_response("health_check", e),
            },
        }
    }
}

/// Logs a request-level failure and shapes it for the wire.
fn error_response(context: &str, error: AppError) -> DbResponse {
    error.log(context);
    DbResponse::Error {
        message: error.to_string(),
    }
}

/// A clean disconnect shows up as an unexpected-EOF read error.
fn is_disconnect(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<std::io::Error>()
        .map(|io| io.kind() == std::io::ErrorKind::UnexpectedEof)
        .unwrap_or(false)
}
