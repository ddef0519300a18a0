//! ping 子命令：探测一次后端并以退出码报告结果。
use cacatua_core::api::{AppContext, CliError};

use super::cli::PingArgs;

pub async fn handle_ping(args: PingArgs, ctx: &AppContext) -> Result<i32, CliError> {
    let mut cfg = ctx.cfg().clone();
    args.apply(&mut cfg);
    let ctx = ctx.with_config(cfg);

    let services = ctx.build_services().await?;
    let runtime = services.runtime;
    runtime
        .ping()
        .await
        .map_err(|e| CliError::Backend(format!("{} ping failed: {e:#}", runtime.name())))?;

    println!("{} is reachable", runtime.name());
    Ok(0)
}
