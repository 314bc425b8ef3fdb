//! Role entry points for the `simplechat` binary

use simplechat_core::{
    AcceptorConfig, ConsoleInput, ConsoleOutput, OutboundQueue, SupervisorConfig,
    TcpChatListener, TcpConnector,
};
use simplechat_runtime::{spawn_console_producer, ConnectionAcceptor, SessionSupervisor};
use tracing::info;

use crate::cli::{Cli, Commands};
use crate::config::AppConfig;
use crate::error::Result;

/// Routes a parsed command line to the matching role
pub struct CommandDispatcher;

impl CommandDispatcher {
    /// Run the selected role. Both roles run until the process is killed.
    pub async fn execute(cli: Cli, config: AppConfig) -> Result<()> {
        match cli.command {
            Commands::Server { name, port } => {
                let port = port.unwrap_or(config.default_port);
                run_server(&name, port, &config).await
            }
            Commands::Client {
                name,
                server_address,
                port,
            } => {
                let port = port.unwrap_or(config.default_port);
                run_client(&name, &server_address, port, &config).await
            }
        }
    }
}

/// Accept connections on `port`, chatting as `name`
pub async fn run_server(name: &str, port: u16, config: &AppConfig) -> Result<()> {
    let acceptor_config = AcceptorConfig::new(config.session_config(name), port);
    acceptor_config.validate()?;

    info!("Starting server '{}' on port {}", name, port);
    let listener = TcpChatListener::bind(&acceptor_config.bind_address, config.max_frame_len).await?;

    let queue = OutboundQueue::new();
    let _producer = spawn_console_producer(queue.clone());

    ConnectionAcceptor::new(acceptor_config, queue)
        .serve(listener, ConsoleOutput::new())
        .await;
    Ok(())
}

/// Connect to `server_address:port` as `name`, reconnecting forever
pub async fn run_client(
    name: &str,
    server_address: &str,
    port: u16,
    config: &AppConfig,
) -> Result<()> {
    let supervisor_config = SupervisorConfig::new(
        config.session_config(name),
        target_address(server_address, port),
    )
    .with_retry_delay(config.retry_delay());
    supervisor_config.validate()?;

    let mut input = ConsoleInput::stdin();
    let mut output = ConsoleOutput::new();
    SessionSupervisor::new(supervisor_config, TcpConnector::new(config.max_frame_len))
        .serve(&mut input, &mut output)
        .await;
    Ok(())
}

/// Join host and port, bracketing bare IPv6 literals
fn target_address(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}
