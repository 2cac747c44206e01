use std::time::Duration;

use async_trait::async_trait;
use domain::{DomainError, ReadRequest, RegisterBank};
use tokio_modbus::client::Context;
use tokio_modbus::prelude::*;
use tokio_serial::SerialStream;

use super::RegisterLink;
use crate::config::BusConfig;

fn to_parity(parity: &str) -> Result<tokio_serial::Parity, DomainError> {
    match parity.to_lowercase().as_str() {
        "n" | "none" => Ok(tokio_serial::Parity::None),
        "o" | "odd" => Ok(tokio_serial::Parity::Odd),
        "e" | "even" => Ok(tokio_serial::Parity::Even),
        _ => Err(DomainError::InvalidConfiguration(format!(
            "Invalid parity: {}",
            parity
        ))),
    }
}

fn to_stop_bits(stop_bits: u8) -> Result<tokio_serial::StopBits, DomainError> {
    match stop_bits {
        1 => Ok(tokio_serial::StopBits::One),
        2 => Ok(tokio_serial::StopBits::Two),
        _ => Err(DomainError::InvalidConfiguration(format!(
            "Invalid stop bits: {}",
            stop_bits
        ))),
    }
}

fn to_data_bits(data_bits: u8) -> Result<tokio_serial::DataBits, DomainError> {
    match data_bits {
        5 => Ok(tokio_serial::DataBits::Five),
        6 => Ok(tokio_serial::DataBits::Six),
        7 => Ok(tokio_serial::DataBits::Seven),
        8 => Ok(tokio_serial::DataBits::Eight),
        _ => Err(DomainError::InvalidConfiguration(format!(
            "Invalid data bits: {}",
            data_bits
        ))),
    }
}

/// Modbus RTU over a serial port.
///
/// The port is opened on the first exchange and closed again after any
/// transport failure, so a device unplugged and replugged is picked up on the
/// next poll.
pub struct ModbusRtuLink {
    config: BusConfig,
    context: Option<Context>,
}

impl ModbusRtuLink {
    /// Validates the serial settings without touching the port
    pub fn new(config: BusConfig) -> Result<Self, DomainError> {
        to_parity(&config.parity)?;
        to_stop_bits(config.stop_bits)?;
        to_data_bits(config.data_bits)?;
        Ok(Self {
            config,
            context: None,
        })
    }

    fn port_name(&self) -> String {
        if cfg!(target_os = "windows") && !self.config.port.starts_with(r"\\.\") {
            format!(r"\\.\{}", self.config.port)
        } else {
            self.config.port.clone()
        }
    }

    fn open(&mut self) -> Result<&mut Context, DomainError> {
        if self.context.is_none() {
            let port_name = self.port_name();
            let builder = tokio_serial::new(&port_name, self.config.baud_rate)
                .data_bits(to_data_bits(self.config.data_bits)?)
                .parity(to_parity(&self.config.parity)?)
                .stop_bits(to_stop_bits(self.config.stop_bits)?)
                .timeout(Duration::from_millis(self.config.timeout_ms));

            let port = SerialStream::open(&builder).map_err(|e| {
                let err_msg = format!("Failed to open serial port {}: {}", port_name, e);
                tracing::error!("{}", err_msg);
                DomainError::Transport(err_msg)
            })?;

            tracing::info!(port = %port_name, baud_rate = self.config.baud_rate, "Serial port opened");
            // Slave id is switched per request
            self.context = Some(tokio_modbus::client::rtu::attach_slave(port, Slave(1)));
        }

        self.context
            .as_mut()
            .ok_or_else(|| DomainError::Transport("Serial port not open".into()))
    }
}

#[async_trait]
impl RegisterLink for ModbusRtuLink {
    async fn read(&mut self, address: u8, request: &ReadRequest) -> Result<Vec<u16>, DomainError> {
        let ctx = self.open()?;
        ctx.set_slave(Slave(address));

        let result = match request.bank {
            RegisterBank::Holding => {
                ctx.read_holding_registers(request.start, request.count)
                    .await
            }
            RegisterBank::Input => ctx.read_input_registers(request.start, request.count).await,
        };

        match result {
            Ok(Ok(words)) => Ok(words),
            Ok(Err(exception)) => Err(DomainError::Transport(format!(
                "Modbus exception from device {}: {}",
                address, exception
            ))),
            Err(e) => Err(DomainError::Transport(format!(
                "Modbus transport error: {}",
                e
            ))),
        }
    }

    fn reset(&mut self) {
        // Dropping the context closes the port; the next read reopens it.
        self.context = None;
    }

    fn describe(&self) -> String {
        format!("modbus-rtu:{}@{}", self.config.port, self.config.baud_rate)
    }
}
