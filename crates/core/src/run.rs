// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Top-level server runner (§2 "Control flow", §5 "Concurrency &
//! Resource Model"): binds both listeners, wires the admission tracker,
//! node registry, and IP list watcher, and spawns one task per accepted
//! connection running the full admit → negotiate → menu-executor →
//! disconnect pipeline.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::admission::{AdmissionPolicy, AdmissionTracker, IpListWatcher};
use crate::callrecord::{CallRecord, CallRecordLog};
use crate::config::{OutputModeFlag, ServerConfig};
use crate::error::Error;
use crate::menu::{MenuExecutor, MenuProvider, NoPromptCollaborator, NullMenuProvider, PromptCollaborator};
use crate::node::NodeRegistry;
use crate::outputmode;
use crate::session::Session;
use crate::transport::ssh::SshEndpoint;
use crate::transport::telnet::{self, TelnetEndpoint};
use crate::transport::TransportSession;
use crate::user::UserService;

/// Admission handshake deadline (§5): from TCP accept to a ready,
/// negotiated session.
const ADMIT_DEADLINE: Duration = Duration::from_secs(30);

/// Collaborators the runner wires together; everything beyond the core
/// transports/admission/menu state machine is an external interface
/// (§1), injected here rather than constructed internally.
pub struct ServerDeps {
    pub users: Arc<dyn UserService>,
    pub menu_provider: Arc<dyn MenuProvider>,
    pub prompts: Arc<dyn PromptCollaborator>,
}

impl Default for ServerDeps {
    fn default() -> Self {
        Self {
            users: Arc::new(crate::user::InMemoryUserService::new()),
            menu_provider: Arc::new(NullMenuProvider),
            prompts: Arc::new(NoPromptCollaborator),
        }
    }
}

/// Run the server until `shutdown` is cancelled. Returns once every
/// spawned listener task has exited.
pub async fn run(config: ServerConfig, output_flag: OutputModeFlag, deps: ServerDeps, shutdown: CancellationToken) -> Result<(), Error> {
    if !config.ssh_enabled && !config.telnet_enabled {
        return Err(Error::ConfigInvalid("at least one of sshEnabled/telnetEnabled must be true".into()));
    }

    let policy = AdmissionPolicy {
        max_nodes: config.max_nodes,
        max_per_ip: config.max_connections_per_ip,
        max_failed_logins: config.max_failed_logins,
        lockout: Duration::from_secs(config.lockout_minutes * 60),
        blocklist_path: config.ip_blocklist_path.clone(),
    };
    let tracker = AdmissionTracker::new(policy);
    let node_registry = NodeRegistry::new(config.max_nodes);
    let call_records = Arc::new(CallRecordLog::new(config.node_record_path.clone()));

    let ip_watcher = IpListWatcher::new(config.ip_allowlist_path.clone(), config.ip_blocklist_path.clone(), tracker.clone());
    ip_watcher.load_initial();
    let watcher_shutdown = shutdown.clone();
    let watcher_task = tokio::spawn(ip_watcher.run(watcher_shutdown));

    let executor = Arc::new(MenuExecutor::new(
        deps.menu_provider.clone(),
        deps.users.clone(),
        deps.prompts.clone(),
        config.co_sysop_level,
    ));

    let mut listener_tasks = Vec::new();

    if config.telnet_enabled {
        let listener = TelnetEndpoint::bind(&config.telnet_host, config.telnet_port)
            .await
            .map_err(|e| Error::ConfigInvalid(format!("binding telnet listener: {e}")))?;
        info!("telnet listener bound on {}:{}", config.telnet_host, config.telnet_port);

        let tracker = tracker.clone();
        let node_registry = node_registry.clone();
        let executor = executor.clone();
        let call_records = call_records.clone();
        let board_name = config.board_name.clone();
        let output_flag = output_flag;
        let shutdown = shutdown.clone();

        listener_tasks.push(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    accepted = listener.accept() => {
                        let Ok((stream, remote_addr)) = accepted else { continue };
                        let tracker = tracker.clone();
                        let node_registry = node_registry.clone();
                        let executor = executor.clone();
                        let call_records = call_records.clone();
                        let board_name = board_name.clone();
                        tokio::spawn(async move {
                            handle_telnet_connection(stream, remote_addr, tracker, node_registry, executor, call_records, board_name, output_flag).await;
                        });
                    }
                }
            }
        }));
    }

    if config.ssh_enabled {
        let ssh_endpoint = Arc::new(SshEndpoint::load(&config.host_key_path, config.legacy_ssh_algorithms)?);
        let listener = tokio::net::TcpListener::bind((config.ssh_host.as_str(), config.ssh_port))
            .await
            .map_err(|e| Error::ConfigInvalid(format!("binding ssh listener: {e}")))?;
        info!("ssh listener bound on {}:{}", config.ssh_host, config.ssh_port);

        let tracker = tracker.clone();
        let node_registry = node_registry.clone();
        let executor = executor.clone();
        let call_records = call_records.clone();
        let board_name = config.board_name.clone();
        let shutdown = shutdown.clone();

        listener_tasks.push(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    accepted = listener.accept() => {
                        let Ok((stream, remote_addr)) = accepted else { continue };
                        let ssh_endpoint = ssh_endpoint.clone();
                        let tracker = tracker.clone();
                        let node_registry = node_registry.clone();
                        let executor = executor.clone();
                        let call_records = call_records.clone();
                        let board_name = board_name.clone();
                        tokio::spawn(async move {
                            handle_ssh_connection(stream, remote_addr, ssh_endpoint, tracker, node_registry, executor, call_records, board_name, output_flag).await;
                        });
                    }
                }
            }
        }));
    }

    for task in listener_tasks {
        let _ = task.await;
    }
    let _ = watcher_task.await;
    Ok(())
}

async fn handle_telnet_connection(
    stream: TcpStream,
    remote_addr: SocketAddr,
    tracker: AdmissionTracker,
    node_registry: NodeRegistry,
    executor: Arc<MenuExecutor>,
    call_records: Arc<CallRecordLog>,
    board_name: String,
    output_flag: OutputModeFlag,
) {
    if admit_or_refuse(&tracker, &stream, remote_addr).await.is_none() {
        return;
    }

    let local_addr = stream.local_addr().unwrap_or(remote_addr);
    let negotiated = tokio::time::timeout(ADMIT_DEADLINE, telnet::negotiate(stream, local_addr, remote_addr, board_name)).await;
    let mut transport = match negotiated {
        Ok(Ok(session)) => session,
        Ok(Err(e)) => {
            warn!("telnet negotiation failed from {remote_addr}: {e}");
            tracker.release(remote_addr.ip());
            return;
        }
        Err(_) => {
            warn!("telnet negotiation timed out from {remote_addr}");
            tracker.release(remote_addr.ip());
            return;
        }
    };

    run_session(&mut transport, remote_addr, node_registry, tracker, executor, call_records, output_flag).await;
}

async fn handle_ssh_connection(
    stream: TcpStream,
    remote_addr: SocketAddr,
    ssh_endpoint: Arc<SshEndpoint>,
    tracker: AdmissionTracker,
    node_registry: NodeRegistry,
    executor: Arc<MenuExecutor>,
    call_records: Arc<CallRecordLog>,
    board_name: String,
    output_flag: OutputModeFlag,
) {
    if admit_or_refuse(&tracker, &stream, remote_addr).await.is_none() {
        return;
    }

    let local_addr = stream.local_addr().unwrap_or(remote_addr);
    let accepted = tokio::time::timeout(ADMIT_DEADLINE, ssh_endpoint.accept(stream, remote_addr, local_addr, board_name)).await;
    let mut transport = match accepted {
        Ok(Ok(session)) => session,
        Ok(Err(e)) => {
            warn!("ssh handshake failed from {remote_addr}: {e}");
            tracker.release(remote_addr.ip());
            return;
        }
        Err(_) => {
            warn!("ssh handshake timed out from {remote_addr}");
            tracker.release(remote_addr.ip());
            return;
        }
    };

    run_session(&mut transport, remote_addr, node_registry, tracker, executor, call_records, output_flag).await;
}

/// §4.1's admission write path, with the client-facing rejection write
/// and a short sleep before close, matching §7's `AdmissionRejected`
/// policy.
async fn admit_or_refuse(tracker: &AdmissionTracker, stream: &TcpStream, remote_addr: SocketAddr) -> Option<()> {
    match tracker.try_admit(remote_addr.ip()) {
        crate::admission::AdmitResult::Admitted => Some(()),
        crate::admission::AdmitResult::Rejected(reason) => {
            info!("admission rejected for {remote_addr}: {reason}");
            let _ = stream.try_write(format!("{reason}\r\n").as_bytes());
            tokio::time::sleep(Duration::from_secs(2)).await;
            None
        }
    }
}

async fn run_session(
    transport: &mut dyn TransportSession,
    remote_addr: SocketAddr,
    node_registry: NodeRegistry,
    tracker: AdmissionTracker,
    executor: Arc<MenuExecutor>,
    call_records: Arc<CallRecordLog>,
    output_flag: OutputModeFlag,
) {
    let node_slot = node_registry.assign();
    let pty = transport.pty();
    let detected_mode = outputmode::resolve(output_flag, pty.is_some(), pty.as_ref().map(|p| p.term.as_str()), pty.as_ref().map(|p| p.width).unwrap_or(80));
    let (terminal, _resize_rx) = crate::session::TerminalState::new();
    terminal.set(pty.as_ref().map(|p| p.width).unwrap_or(80), pty.as_ref().map(|p| p.height).unwrap_or(25));

    let session = Session::new(node_slot, remote_addr, detected_mode, terminal, transport.context().clone());

    info!(node = node_slot, remote = %remote_addr, "session started");
    let connected_at = Instant::now();
    let connected_at_wall = SystemTime::now();

    executor.run(&session, transport).await;

    let username = session.username();
    if let Some(username) = &username {
        call_records
            .append(&CallRecord {
                node_slot,
                remote_addr,
                username: Some(username.clone()),
                invisible: session.is_invisible(),
                connected_at: connected_at_wall,
                duration: connected_at.elapsed(),
            })
            .await;
    }

    transport.close().await;
    node_registry.release(node_slot);
    tracker.release(remote_addr.ip());
    info!(node = node_slot, remote = %remote_addr, "session ended");
}
