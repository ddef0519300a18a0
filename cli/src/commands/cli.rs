use std::path::PathBuf;

use cacatua_core::api::AppConfig;
use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "cacatua", version, about = "HTTP/JSON gateway for a container runtime")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Read config from this file instead of ~/.cacatua/config.toml or ./config.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct ServeArgs {
    #[arg(long)]
    pub host: Option<String>,

    #[arg(long)]
    pub port: Option<u16>,

    /// Podman service URL, e.g. unix:///run/user/1000/podman/podman.sock or http://127.0.0.1:8888
    #[arg(long)]
    pub backend_url: Option<String>,
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct PingArgs {
    #[arg(long)]
    pub backend_url: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP gateway (default).
    Serve(ServeArgs),
    /// Check the backend once and exit.
    Ping(PingArgs),
}

impl ServeArgs {
    /// CLI flags win over config file and environment.
    pub fn apply(&self, cfg: &mut AppConfig) {
        if let Some(host) = &self.host {
            cfg.http_server.host = host.clone();
        }
        if let Some(port) = self.port {
            cfg.http_server.port = port;
        }
        if let Some(url) = &self.backend_url {
            *cfg.backend.base_url_mut() = url.clone();
        }
    }
}

impl PingArgs {
    pub fn apply(&self, cfg: &mut AppConfig) {
        if let Some(url) = &self.backend_url {
            *cfg.backend.base_url_mut() = url.clone();
        }
    }
}
