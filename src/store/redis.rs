//! Redis implementation of the store abstraction.
//!
//! Boundary scores live in one sorted set; the attributes of each boundary
//! live in a hash keyed by the boundary id. Every batch goes through a
//! MULTI/EXEC pipeline so a mutation commits entirely or not at all.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use tracing::debug;

use crate::boundary::Point;
use crate::config::Config;
use crate::error::{Result, RiprError};

use super::{RangeQuery, RangeStore, RawAttrs, ScoreEntry, WriteBatch, WriteOp};

/// A [`RangeStore`] backed by a Redis server.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    ranges_key: String,
}

/// Score argument accepted by ZADD and the range commands.
fn score_arg(point: Point) -> String {
    match point {
        Point::NegInf => "-inf".to_string(),
        Point::PosInf => "+inf".to_string(),
        Point::Ip(v) => v.to_string(),
    }
}

fn flag_arg(v: bool) -> &'static str {
    if v { "1" } else { "0" }
}

impl RedisStore {
    /// Connect to the server, verify it answers PING, and return the store.
    pub async fn connect(config: &Config) -> Result<Self> {
        let (host, port) = config.host_port();
        let addr = if config.tls {
            ConnectionAddr::TcpTls {
                host,
                port,
                insecure: false,
                tls_params: None,
            }
        } else {
            ConnectionAddr::Tcp(host, port)
        };

        let info = ConnectionInfo {
            addr,
            redis: RedisConnectionInfo {
                db: config.db,
                username: (!config.username.is_empty()).then(|| config.username.clone()),
                password: (!config.password.is_empty()).then(|| config.password.clone()),
                ..Default::default()
            },
        };

        let client = redis::Client::open(info).map_err(RiprError::ConnectionFailed)?;
        let manager_config = ConnectionManagerConfig::new()
            .set_connection_timeout(Duration::from_millis(config.connect_timeout_ms))
            .set_response_timeout(Duration::from_millis(config.response_timeout_ms))
            .set_number_of_retries(config.retries);
        let mut conn = ConnectionManager::new_with_config(client, manager_config)
            .await
            .map_err(RiprError::ConnectionFailed)?;

        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(RiprError::ConnectionFailed)?;
        if pong != "PONG" {
            return Err(RiprError::ConnectionFailed(redis::RedisError::from((
                redis::ErrorKind::ResponseError,
                "unexpected PING reply",
            ))));
        }

        debug!(addr = %config.addr, db = config.db, "connected to redis");

        Ok(Self {
            conn,
            ranges_key: config.ranges_key.clone(),
        })
    }
}

#[async_trait]
impl RangeStore for RedisStore {
    async fn range_scores(&self, queries: &[RangeQuery]) -> Result<Vec<Vec<ScoreEntry>>> {
        let mut conn = self.conn.clone();
        let mut pipe = redis::pipe();
        pipe.atomic();

        for query in queries {
            match query {
                RangeQuery::Asc { min, max, limit } => {
                    let cmd = pipe
                        .cmd("ZRANGEBYSCORE")
                        .arg(&self.ranges_key)
                        .arg(score_arg(*min))
                        .arg(score_arg(*max))
                        .arg("WITHSCORES");
                    if let Some(n) = limit {
                        cmd.arg("LIMIT").arg(0).arg(*n);
                    }
                }
                RangeQuery::Desc { min, max, limit } => {
                    let cmd = pipe
                        .cmd("ZREVRANGEBYSCORE")
                        .arg(&self.ranges_key)
                        .arg(score_arg(*max))
                        .arg(score_arg(*min))
                        .arg("WITHSCORES");
                    if let Some(n) = limit {
                        cmd.arg("LIMIT").arg(0).arg(*n);
                    }
                }
            }
        }

        let replies: Vec<Vec<(String, f64)>> = pipe
            .query_async(&mut conn)
            .await
            .map_err(RiprError::NoResult)?;

        Ok(replies
            .into_iter()
            .map(|entries| {
                entries
                    .into_iter()
                    .map(|(id, score)| ScoreEntry {
                        point: Point::from_score(score),
                        id,
                    })
                    .collect()
            })
            .collect())
    }

    async fn get_attrs(&self, ids: &[String]) -> Result<Vec<RawAttrs>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.conn.clone();
        let mut pipe = redis::pipe();
        pipe.atomic();
        for id in ids {
            pipe.cmd("HMGET").arg(id).arg("low").arg("high").arg("reason");
        }

        let replies: Vec<(Option<String>, Option<String>, Option<String>)> = pipe
            .query_async(&mut conn)
            .await
            .map_err(RiprError::NoResult)?;

        Ok(replies
            .into_iter()
            .map(|(lower, upper, reason)| RawAttrs {
                lower,
                upper,
                reason,
            })
            .collect())
    }

    async fn apply(&self, batch: WriteBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn.clone();
        let mut pipe = redis::pipe();
        pipe.atomic();

        for op in batch.ops() {
            match op {
                WriteOp::AddScore { id, point } => {
                    pipe.cmd("ZADD")
                        .arg(&self.ranges_key)
                        .arg(score_arg(*point))
                        .arg(id)
                        .ignore();
                }
                WriteOp::RemoveScore { id } => {
                    pipe.cmd("ZREM").arg(&self.ranges_key).arg(id).ignore();
                }
                WriteOp::SetAttrs {
                    id,
                    lower,
                    upper,
                    reason,
                } => {
                    pipe.cmd("HSET")
                        .arg(id)
                        .arg("low")
                        .arg(flag_arg(*lower))
                        .arg("high")
                        .arg(flag_arg(*upper))
                        .arg("reason")
                        .arg(reason)
                        .ignore();
                }
                WriteOp::DeleteAttrs { id } => {
                    pipe.cmd("DEL").arg(id).ignore();
                }
            }
        }

        let _: () = pipe
            .query_async(&mut conn)
            .await
            .map_err(RiprError::Store)?;
        Ok(())
    }

    async fn flush_all(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("FLUSHDB")
            .query_async(&mut conn)
            .await
            .map_err(RiprError::Store)?;
        Ok(())
    }
}
