// src/exec/builtin.rs

//! Task handlers available to every project: the actions a `[[rule]]` can
//! name.

use std::path::{Component, Path, PathBuf};

use anyhow::{anyhow, bail, Result};
use tracing::{debug, info};

use crate::output::write_manifest;
use crate::tasks::{HandlerRegistry, TaskArg, TaskContext};

pub const COPY: &str = "copy";
pub const COMMAND: &str = "command";
pub const RELOAD: &str = "reload";
pub const MANIFEST: &str = "manifest";

pub fn register_builtins(registry: &mut HandlerRegistry) {
    registry.register_fn(COPY, copy_task);
    registry.register_fn(COMMAND, command_task);
    registry.register_fn(RELOAD, reload_task);
    registry.register_fn(MANIFEST, manifest_task);
}

/// `copy(src_abs, dest_rel)`.
fn copy_task(ctx: &mut TaskContext<'_>, args: &[TaskArg]) -> Result<()> {
    let src = Path::new(str_arg(args, 0, "source path")?);
    let dest = output_path(&ctx.settings.output_dir, str_arg(args, 1, "destination")?)?;

    // Removed between the rule firing and this flush.
    if !ctx.fs.is_file(src) {
        debug!(src = ?src, "copy source gone; skipping");
        return Ok(());
    }

    let bytes = ctx.fs.copy(src, &dest)?;
    debug!(src = ?src, dest = ?dest, bytes, "copied");
    Ok(())
}

/// `command(description, argv)`. The process is tracked; its exit status
/// arrives later as an engine event.
fn command_task(ctx: &mut TaskContext<'_>, args: &[TaskArg]) -> Result<()> {
    let description = str_arg(args, 0, "description")?;
    let argv = args
        .get(1)
        .and_then(TaskArg::as_list)
        .ok_or_else(|| anyhow!("missing argv list"))?;
    ctx.processes.spawn(description, argv, &ctx.settings.root)?;
    Ok(())
}

/// `reload(rel)`: tell connected browsers that `rel` changed.
fn reload_task(ctx: &mut TaskContext<'_>, args: &[TaskArg]) -> Result<()> {
    let rel = str_arg(args, 0, "output path")?;
    let clients = ctx.reload.notify(rel);
    info!(path = %rel, clients, "live reload");
    Ok(())
}

fn manifest_task(ctx: &mut TaskContext<'_>, _args: &[TaskArg]) -> Result<()> {
    write_manifest(ctx.fs, &ctx.settings.output_dir, &ctx.settings.manifest)?;
    Ok(())
}

fn str_arg<'a>(args: &'a [TaskArg], index: usize, what: &str) -> Result<&'a str> {
    args.get(index)
        .and_then(TaskArg::as_str)
        .ok_or_else(|| anyhow!("missing {what} (argument {index})"))
}

/// Join an output-relative destination onto `out_dir`, refusing anything
/// that would land outside it.
fn output_path(out_dir: &Path, dest: &str) -> Result<PathBuf> {
    let rel = Path::new(dest);
    for component in rel.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            _ => bail!("copy destination '{dest}' escapes the output directory"),
        }
    }
    if dest.is_empty() {
        bail!("copy destination is empty");
    }
    Ok(out_dir.join(rel))
}
