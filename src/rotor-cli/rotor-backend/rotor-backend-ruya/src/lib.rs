// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Backend for turntables speaking the RUYA ASCII dialect.
//!
//! Strictly half-duplex: every operation is one framed command followed by
//! one line read under a timeout. Stale input is cleared before each
//! exchange so a late frame from a previous poll cannot be taken for the
//! current answer.

use chrono::Utc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::{timeout, Duration};
use tokio_serial::{ClearBuffer, SerialPort, SerialPortBuilderExt, SerialStream};
use tracing::debug;

use rotor_core::motion::{MotionPlan, SpeedPlan};
use rotor_core::table::{
    AckFuture, TableAccess, TableInfo, TelemetryFuture, TelemetrySample, Turntable,
};
use rotor_core::{DriveError, DriveResult};
use rotor_protocol::{command, parse_line, FrameCodec, ResponseToken};

/// Serial driver for the RUYA protocol.
pub struct RuyaTable {
    port: SerialStream,
    framing: FrameCodec,
    info: TableInfo,
}

impl RuyaTable {
    const READ_TIMEOUT: Duration = Duration::from_millis(500);

    pub fn new(path: &str, baud: u32, framing: FrameCodec) -> DriveResult<Self> {
        let builder = tokio_serial::new(path, baud);
        let port = builder.open_native_async().map_err(|e| {
            DriveError::Communication(format!("open serial port {} @ {} baud: {}", path, baud, e))
        })?;
        let info = TableInfo {
            manufacturer: "RUYA".to_string(),
            model: "single-axis turntable".to_string(),
            protocol: "ruya".to_string(),
            access: TableAccess::Serial {
                path: path.to_string(),
                baud,
            },
        };
        Ok(Self {
            port,
            framing,
            info,
        })
    }

    async fn write_cmd(&mut self, payload: &str) -> DriveResult<()> {
        let frame = self.framing.encode(payload);
        self.port
            .write_all(frame.as_bytes())
            .await
            .map_err(|e| DriveError::Communication(format!("serial write: {}", e)))?;
        self.port
            .flush()
            .await
            .map_err(|e| DriveError::Communication(format!("serial flush: {}", e)))?;
        debug!("sent {}", payload);
        Ok(())
    }

    async fn read_response(&mut self) -> DriveResult<String> {
        let mut buf = Vec::new();
        let read = async {
            loop {
                let mut byte = [0u8; 1];
                self.port.read_exact(&mut byte).await?;
                if byte[0] == b'\n' {
                    break;
                }
                buf.push(byte[0]);
            }
            Ok::<(), std::io::Error>(())
        };
        timeout(Self::READ_TIMEOUT, read)
            .await
            .map_err(|_| DriveError::get_data_failed())?
            .map_err(|e| DriveError::Communication(format!("serial read: {}", e)))?;
        let line = String::from_utf8_lossy(&buf).trim().to_string();
        debug!("received {}", line);
        Ok(line)
    }

    /// One half-duplex exchange: clear stale input, send, read one line.
    async fn exchange(&mut self, payload: &str) -> DriveResult<ResponseToken> {
        let _ = self.port.clear(ClearBuffer::Input);
        self.write_cmd(payload).await?;
        let line = self.read_response().await?;
        Ok(parse_line(&self.framing, &line))
    }

    async fn expect_ack(&mut self, payload: &str) -> DriveResult<()> {
        match self.exchange(payload).await? {
            ResponseToken::Ok => Ok(()),
            ResponseToken::Error(reason) => Err(DriveError::Communication(reason)),
            other => Err(DriveError::Communication(format!(
                "unexpected response: {}",
                other
            ))),
        }
    }

    async fn sample(&mut self) -> DriveResult<TelemetrySample> {
        match self.exchange(command::STATUS_QUERY).await? {
            ResponseToken::Telemetry {
                status,
                alarm,
                angle_deg,
            } => Ok(TelemetrySample {
                timestamp: Utc::now(),
                status,
                alarm,
                angle_deg,
            }),
            ResponseToken::Error(reason) => Err(DriveError::Communication(reason)),
            other => Err(DriveError::Communication(format!(
                "unexpected response: {}",
                other
            ))),
        }
    }
}

impl Turntable for RuyaTable {
    fn info(&self) -> &TableInfo {
        &self.info
    }

    fn read_telemetry(&mut self) -> TelemetryFuture<'_> {
        Box::pin(async move { self.sample().await })
    }

    fn enable(&mut self) -> AckFuture<'_> {
        Box::pin(async move { self.expect_ack(command::ENABLE).await })
    }

    fn release(&mut self) -> AckFuture<'_> {
        Box::pin(async move { self.expect_ack(command::RELEASE).await })
    }

    fn halt(&mut self) -> AckFuture<'_> {
        Box::pin(async move { self.expect_ack(command::HALT).await })
    }

    fn run_speed(&mut self, plan: &SpeedPlan) -> AckFuture<'_> {
        let payload = command::speed_run(plan);
        Box::pin(async move { self.expect_ack(&payload).await })
    }

    fn run_position(&mut self, plan: &MotionPlan) -> AckFuture<'_> {
        let payload = command::position_run(plan);
        Box::pin(async move { self.expect_ack(&payload).await })
    }
}
