//! Basic usage example - describe the host and recode a file to UTF-16LE

use portkit_core::{
    check_executable, ghostscript_command, run, PlatformContext, PlatformInfo, PortableFile,
    Result, Transcoder,
};
use std::io::Read;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_target(false)
        .compact()
        .init();

    let info = PlatformInfo::current();
    println!("{info:#?}");

    let mut ctx = PlatformContext::new();
    println!("Install directory: {}", ctx.compute_short_dir_once()?.display());

    let gs = ghostscript_command();
    if check_executable(gs) {
        ctx.timer_start()?;
        let status = run(gs, "--version", true);
        let seconds = ctx.timer_stop()?;
        println!("{gs} finished with {status} after {seconds:.3}s");
    } else {
        println!("{gs} is not installed");
    }

    // Path from args, or this example's own source
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| file!().to_string());
    let mut input = Vec::new();
    PortableFile::open(&path, "rb")?.read_to_end(&mut input)?;

    let mut transcoder = Transcoder::open("UTF-16LE", "UTF-8")?;
    let mut output = vec![0u8; input.len() * 4];
    let step = transcoder.convert(&input, &mut output)?;
    transcoder.close()?;
    println!(
        "{}: {} of {} bytes recoded into {} bytes ({:?})",
        path,
        step.consumed,
        input.len(),
        step.produced,
        step.status
    );

    Ok(())
}
