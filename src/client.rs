//! Main [`BtModule`] driver implementation.
//!
//! This module provides the high-level [`BtModule`] facade that combines
//! the transport, the command handler and the remembered remote address
//! into a unified interface.

use bytes::Bytes;

use crate::commands::{CommandHandler, PollMode, Received};
use crate::config::ModuleConfig;
use crate::error::Result;
use crate::protocol::{Command, validate_name};
use crate::transport::{SerialTransport, Transport, serial::SerialConfig};
use crate::types::{BaudRate, ModuleStatus, Pin, RemoteAddress, Role};

/// Driver for one serial-attached Bluetooth module.
///
/// The driver owns its transport; operations take `&mut self`, so only one
/// can be in flight at a time.
pub struct BtModule<T> {
    commands: CommandHandler<T>,
    remote_address: Option<RemoteAddress>,
    role: Role,
}

impl BtModule<SerialTransport> {
    /// Creates a new driver for a serial port.
    ///
    /// # Arguments
    ///
    /// * `port` - Serial port path (e.g., "/dev/ttyUSB0")
    ///
    /// # Returns
    ///
    /// A new driver (port not yet opened; see [`BtModule::configure`]).
    #[must_use]
    pub fn serial(port: impl Into<String>) -> Self {
        Self::with_serial_config(SerialConfig::new(port))
    }

    /// Creates a new driver with custom serial configuration.
    #[must_use]
    pub fn with_serial_config(config: SerialConfig) -> Self {
        Self::new(SerialTransport::new(config))
    }
}

impl<T: Transport> BtModule<T> {
    /// Creates a new driver over the given transport with default timings.
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, ModuleConfig::default())
    }

    /// Creates a new driver over the given transport.
    #[must_use]
    pub const fn with_config(transport: T, config: ModuleConfig) -> Self {
        Self {
            commands: CommandHandler::new(transport, config),
            remote_address: None,
            role: Role::Slave,
        }
    }

    /// Returns the command handler for direct command access.
    #[must_use]
    pub const fn commands(&self) -> &CommandHandler<T> {
        &self.commands
    }

    /// Returns the command handler mutably.
    pub fn commands_mut(&mut self) -> &mut CommandHandler<T> {
        &mut self.commands
    }

    /// Returns the configured role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Returns true if configured as master.
    #[must_use]
    pub const fn is_master(&self) -> bool {
        self.role.is_master()
    }

    /// Returns true if the transport is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.commands.transport().is_open()
    }

    // ==================== Configuration ====================

    /// Opens the transport and configures role, friendly name and PIN.
    ///
    /// Each setting is sent as its own batch, so this takes three settle
    /// delays.
    pub async fn configure(
        &mut self,
        baud_rate: BaudRate,
        role: Role,
        name: &str,
        pin: Pin,
    ) -> Result<()> {
        validate_name(name)?;

        self.commands
            .transport_mut()
            .open(baud_rate.as_u32())
            .await?;
        self.role = role;

        self.commands.send(Command::SetRole(role)).await?;
        self.commands.send(Command::SetName(name)).await?;
        self.commands.send(Command::SetPin(pin)).await
    }

    /// Enables or disables auto-connect to the last paired device.
    pub async fn set_auto_connect(&mut self, enabled: bool) -> Result<()> {
        self.commands.send(Command::AutoConnect(enabled)).await
    }

    /// Permits or forbids connections from paired devices.
    pub async fn set_paired_connect(&mut self, enabled: bool) -> Result<()> {
        self.commands.send(Command::PairedConnect(enabled)).await
    }

    /// Enables or disables reconnection after link loss.
    pub async fn set_reconnect(&mut self, enabled: bool) -> Result<()> {
        self.commands.send(Command::Reconnect(enabled)).await
    }

    /// Enables or disables command echo.
    pub async fn set_echo(&mut self, enabled: bool) -> Result<()> {
        self.commands.send(Command::Echo(enabled)).await
    }

    /// Clears the pairing PIN.
    pub async fn clear_pin(&mut self) -> Result<()> {
        self.commands.send(Command::ClearPin).await
    }

    /// Changes the module's UART rate.
    ///
    /// The host side keeps its current rate; call [`BtModule::configure`]
    /// with the new rate once the module has switched.
    pub async fn set_module_baud_rate(&mut self, baud_rate: BaudRate) -> Result<()> {
        self.commands.send(Command::SetBaudRate(baud_rate)).await
    }

    /// Asks the module for its local address.
    ///
    /// The reply is left on the transport for [`BtModule::receive_raw`].
    pub async fn request_local_address(&mut self) -> Result<()> {
        self.commands.send(Command::ReadLocalAddress).await
    }

    // ==================== Discovery & Connection ====================

    /// Runs an inquiry and remembers the first device found.
    ///
    /// Returns false if nothing was found; the remembered address is then
    /// left as it was.
    pub async fn discover(&mut self, mode: PollMode) -> Result<bool> {
        match self.commands.inquire(mode).await? {
            Some(address) => {
                tracing::info!("remote device addr: {address}");
                self.remote_address = Some(address);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Connects to `address`, or to the remembered address if `None`.
    ///
    /// A supplied address replaces the remembered one. Returns false without
    /// transmitting anything if neither is available.
    pub async fn connect(&mut self, address: Option<RemoteAddress>, mode: PollMode) -> Result<bool> {
        if let Some(address) = address {
            self.remote_address = Some(address);
        }

        let Some(target) = self.remote_address.as_ref() else {
            tracing::warn!("connect requested without a remote address");
            return Ok(false);
        };

        self.commands.connect(target, mode).await
    }

    /// Returns the remembered remote address.
    #[must_use]
    pub const fn remote_address(&self) -> Option<&RemoteAddress> {
        self.remote_address.as_ref()
    }

    /// Replaces the remembered remote address.
    pub fn set_remote_address(&mut self, address: RemoteAddress) {
        self.remote_address = Some(address);
    }

    /// Waits for a status report and checks it equals `wanted`.
    pub async fn is_ready(&mut self, wanted: ModuleStatus, mode: PollMode) -> Result<bool> {
        self.commands.wait_for_status(wanted, mode).await
    }

    // ==================== Pairing ====================

    /// Waits for a remote device to ask for the PIN.
    pub async fn wait_for_pin_request(&mut self, mode: PollMode) -> Result<bool> {
        self.commands.wait_for_pin_request(mode).await
    }

    /// Answers a remote PIN request.
    pub async fn answer_pin_request(&mut self, pin: Pin) -> Result<()> {
        self.commands.send(Command::AnswerPin(pin)).await
    }

    // ==================== Raw Data ====================

    /// Sends payload bytes over the link.
    ///
    /// Returns false for an empty payload, which is not transmitted.
    pub async fn send_raw(&mut self, data: &[u8]) -> Result<bool> {
        if data.is_empty() {
            return Ok(false);
        }
        self.commands.send_raw(Bytes::copy_from_slice(data)).await?;
        Ok(true)
    }

    /// Receives bytes until `terminator`, or until `ERROR` / `LINK LOSS`.
    ///
    /// Blocks until one of them arrives.
    pub async fn receive_raw(&mut self, terminator: u8) -> Result<Received> {
        self.commands.receive_until(terminator).await
    }

    /// Sends a single byte.
    pub async fn send_byte(&mut self, byte: u8) -> Result<()> {
        self.commands.send_raw(Bytes::copy_from_slice(&[byte])).await
    }

    /// Reads a single byte if one is pending.
    pub async fn read_byte(&mut self) -> Result<Option<u8>> {
        self.commands.read_byte().await
    }

    /// Discards everything pending on the transport, logging it.
    pub async fn drain(&mut self) -> Result<usize> {
        self.commands.drain().await
    }

    // ==================== Teardown ====================

    /// Closes the transport and forgets the remote address.
    ///
    /// The driver can be configured again afterwards.
    pub async fn close(&mut self) -> Result<()> {
        self.remote_address = None;
        self.commands.reset_buffer();
        self.commands.transport_mut().close().await
    }

    /// Consumes the driver and returns its transport.
    pub fn into_transport(self) -> T {
        self.commands.into_transport()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;

    const INQUIRY_LINE: &[u8] = b"\r\n+RTINQ=aa,bb,cc,dd,ee,ff;DeviceName\r\n";

    // Set RUST_LOG=btshield=debug to see the wire traffic of a failing test.
    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn module(transport: &MockTransport) -> BtModule<MockTransport> {
        init_tracing();
        BtModule::new(transport.clone())
    }

    fn address(text: &str) -> RemoteAddress {
        RemoteAddress::new(text).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_discover_records_address() {
        let transport = MockTransport::new();
        transport.enqueue_read(INQUIRY_LINE);
        let mut bt = module(&transport);

        assert!(bt.discover(PollMode::NonBlocking).await.unwrap());
        assert_eq!(bt.remote_address(), Some(&address("aa,bb,cc,dd,ee,ff")));

        let writes = transport.writes();
        assert_eq!(&writes[0][..], b"\r\n+INQ=1\r\n");
        assert_eq!(&writes[1][..], b"\r\n+INQ=0\r\n");
    }

    #[tokio::test(start_paused = true)]
    async fn test_discover_blocking_waits_for_reply() {
        let transport = MockTransport::new();
        transport.reply_on(b"+INQ=1", INQUIRY_LINE);
        let mut bt = module(&transport);

        assert!(bt.discover(PollMode::Blocking).await.unwrap());
        assert_eq!(bt.remote_address().unwrap().as_str(), "aa,bb,cc,dd,ee,ff");
    }

    #[tokio::test(start_paused = true)]
    async fn test_discover_exhaustion_keeps_address() {
        let transport = MockTransport::new();
        transport.enqueue_read(b"\r\n+BTSTATE:2\r\nOK\r\n");
        let mut bt = module(&transport);
        bt.set_remote_address(address("01,02,03,04,05,06"));

        assert!(!bt.discover(PollMode::NonBlocking).await.unwrap());
        assert_eq!(transport.empty_polls(), 100);
        assert_eq!(bt.remote_address(), Some(&address("01,02,03,04,05,06")));
        assert_eq!(transport.count_writes(b"\r\n+INQ=0\r\n"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_discover_survives_buffer_overflow() {
        let transport = MockTransport::new();
        transport.enqueue_read(&[b'~'; 300]);
        transport.enqueue_read(INQUIRY_LINE);
        let mut bt = module(&transport);

        assert!(bt.discover(PollMode::NonBlocking).await.unwrap());
        assert_eq!(bt.remote_address().unwrap().as_str(), "aa,bb,cc,dd,ee,ff");
    }

    #[tokio::test(start_paused = true)]
    async fn test_discover_with_long_device_name() {
        let transport = MockTransport::new();
        let line = format!("\r\n+RTINQ=aa,bb,cc,dd,ee,ff;{}\r\n", "N".repeat(110));
        transport.enqueue_read(line.as_bytes());
        let mut bt = module(&transport);

        assert!(bt.discover(PollMode::NonBlocking).await.unwrap());
        assert_eq!(bt.remote_address(), Some(&address("aa,bb,cc,dd,ee,ff")));
        assert_eq!(transport.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_discover_after_line_without_delimiter() {
        let transport = MockTransport::new();
        transport.enqueue_read(b"\r\n+RTINQ=garbage\r\n\r\n+RTINQ=aa,bb,cc,dd,ee,ff;Dev\r\n");
        let mut bt = module(&transport);

        assert!(bt.discover(PollMode::NonBlocking).await.unwrap());
        assert_eq!(bt.remote_address(), Some(&address("aa,bb,cc,dd,ee,ff")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_retries_after_fail() {
        let transport = MockTransport::new();
        transport.enqueue_read(b"CONNECT:FAIL\r\nCONNECT:FAIL\r\nCONNECT:OK\r\n");
        let mut bt = module(&transport);

        let connected = bt
            .connect(Some(address("aa,bb,cc,dd,ee,ff")), PollMode::NonBlocking)
            .await
            .unwrap();

        assert!(connected);
        assert_eq!(transport.count_writes(b"\r\n+CONN=aa,bb,cc,dd,ee,ff\r\n"), 3);
        assert_eq!(transport.writes().len(), 3);
        assert_eq!(bt.remote_address().unwrap().as_str(), "aa,bb,cc,dd,ee,ff");
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_uses_remembered_address() {
        let transport = MockTransport::new();
        transport.reply_on(b"+CONN=", b"\r\nCONNECT:OK\r\n");
        let mut bt = module(&transport);
        bt.set_remote_address(address("11,22,33,44,55,66"));

        assert!(bt.connect(None, PollMode::Blocking).await.unwrap());
        assert_eq!(transport.count_writes(b"\r\n+CONN=11,22,33,44,55,66\r\n"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_without_address() {
        let transport = MockTransport::new();
        let mut bt = module(&transport);

        assert!(!bt.connect(None, PollMode::Blocking).await.unwrap());
        assert!(transport.writes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_match_and_mismatch() {
        let transport = MockTransport::new();
        transport.enqueue_read(b"+BTSTATE:4\r\n");
        let mut bt = module(&transport);
        assert!(bt.is_ready(ModuleStatus::Connected, PollMode::NonBlocking).await.unwrap());

        let transport = MockTransport::new();
        transport.enqueue_read(b"+BTSTATE:4\r\n");
        let mut bt = module(&transport);
        assert!(!bt.is_ready(ModuleStatus::Ready, PollMode::NonBlocking).await.unwrap());
        // Rejected on the first report, without waiting out the budget.
        assert_eq!(transport.empty_polls(), 0);
        assert!(transport.writes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_receive_raw_terminator() {
        let transport = MockTransport::new();
        transport.enqueue_read(b"hello\nworld");
        let mut bt = module(&transport);

        let received = bt.receive_raw(b'\n').await.unwrap();
        assert!(received.terminated);
        assert_eq!(&received.data[..], b"hello\n");
        assert_eq!(transport.pending(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_receive_raw_link_loss() {
        let transport = MockTransport::new();
        transport.enqueue_read(b"LINK LOSS\r\n");
        let mut bt = module(&transport);

        let received = bt.receive_raw(b'\n').await.unwrap();
        assert!(!received.terminated);
        assert_eq!(&received.data[..], b"LINK LOSS");
    }

    #[tokio::test(start_paused = true)]
    async fn test_receive_raw_waits_for_data() {
        let transport = MockTransport::new();
        let handle = transport.clone();
        let mut bt = module(&transport);

        let feeder = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            handle.enqueue_read(b"+ERROR\r\n");
        });

        let received = bt.receive_raw(b'\n').await.unwrap();
        feeder.await.unwrap();
        assert!(!received.terminated);
        assert_eq!(&received.data[..], b"+ERROR");
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_raw() {
        let transport = MockTransport::new();
        let mut bt = module(&transport);

        assert!(!bt.send_raw(b"").await.unwrap());
        assert!(transport.writes().is_empty());

        assert!(bt.send_raw(b"payload").await.unwrap());
        assert_eq!(&transport.written()[..], b"payload");
        assert_eq!(transport.flushes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_configure_is_repeatable() {
        let transport = MockTransport::new();
        let mut bt = module(&transport);
        let pin = Pin::new(7).unwrap();

        bt.configure(BaudRate::B38400, Role::Master, "shield", pin)
            .await
            .unwrap();
        let first = transport.writes();
        transport.clear_writes();
        bt.configure(BaudRate::B38400, Role::Master, "shield", pin)
            .await
            .unwrap();
        let second = transport.writes();

        let expected: Vec<&[u8]> = vec![
            b"\r\n+STWMOD=1\r\n",
            b"\r\n+STNA=shield\r\n",
            b"\r\n+STPIN=0007\r\n",
        ];
        assert_eq!(first, second);
        assert_eq!(first.iter().map(|w| &w[..]).collect::<Vec<_>>(), expected);
        assert_eq!(transport.flushes(), 6);
        assert_eq!(transport.baud_rate(), Some(38_400));
        assert!(bt.is_master());
    }

    #[tokio::test(start_paused = true)]
    async fn test_configure_rejects_bad_name() {
        let transport = MockTransport::new();
        let mut bt = module(&transport);

        let result = bt
            .configure(BaudRate::B9600, Role::Slave, "bad\r\n", Pin::default())
            .await;
        assert!(result.is_err());
        assert!(transport.writes().is_empty());
        assert_eq!(transport.baud_rate(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_policy_commands() {
        let transport = MockTransport::new();
        let mut bt = module(&transport);

        bt.set_auto_connect(true).await.unwrap();
        bt.set_paired_connect(false).await.unwrap();
        bt.set_reconnect(true).await.unwrap();
        bt.set_echo(false).await.unwrap();

        let written = transport.written();
        assert_eq!(
            &written[..],
            b"\r\n+STAUTO=1\r\n\r\n+STOAUT=0\r\n\r\n+LOSSRECONN=1\r\n\r\n+STECHO=0\r\n"
        );
        assert_eq!(transport.flushes(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pin_request_and_answer() {
        let transport = MockTransport::new();
        transport.enqueue_read(b"\r\n+INPIN\r\n");
        let mut bt = module(&transport);

        assert!(bt.wait_for_pin_request(PollMode::NonBlocking).await.unwrap());
        bt.answer_pin_request(Pin::new(1234).unwrap()).await.unwrap();
        assert_eq!(&transport.written()[..], b"\r\n+RTPIN=1234\r\n");
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_forgets_address() {
        let transport = MockTransport::new();
        let mut bt = module(&transport);
        bt.set_remote_address(address("aa,bb,cc,dd,ee,ff"));

        bt.close().await.unwrap();
        assert!(!bt.is_open());
        assert_eq!(bt.remote_address(), None);
        assert!(bt.commands().buffer().is_empty());
        assert!(bt.read_byte().await.is_err());
    }
}
