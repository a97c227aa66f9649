//! Hand the DOT source to a Graphviz layout program.

use anyhow::{Context, Result, bail};
use camino::Utf8Path;
use log::{debug, info};
use std::io::Write;
use std::process::{Command, Stdio};

/// Run `<prog> -T<format> -o <out>` with `dot_source` on stdin. Layout
/// program and output format are passed through uninterpreted.
pub fn render_to_file(dot_source: &str, prog: &str, format: &str, out: &Utf8Path) -> Result<()> {
    debug!("Running {} -T{} -o {}", prog, format, out);
    let mut child = Command::new(prog)
        .arg(format!("-T{}", format))
        .arg("-o")
        .arg(out.as_std_path())
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("Failed to start Graphviz program `{}`", prog))?;
    child
        .stdin
        .take()
        .context("Graphviz stdin unavailable")?
        .write_all(dot_source.as_bytes())
        .with_context(|| format!("Failed to pipe graph into `{}`", prog))?;
    let output = child
        .wait_with_output()
        .with_context(|| format!("Failed to wait for `{}`", prog))?;
    if !output.status.success() {
        bail!(
            "`{}` exited with {}: {}",
            prog,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    info!("Graph rendered to {}", out);
    Ok(())
}

/// Write the DOT source as-is, without running a layout.
pub fn write_source(dot_source: &str, out: &Utf8Path) -> Result<()> {
    std::fs::write(out.as_std_path(), dot_source)
        .with_context(|| format!("Failed to write {}", out))?;
    info!("Graph source written to {}", out);
    Ok(())
}
