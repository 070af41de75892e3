//! Fixture server entrypoint.

use addon_harness::FixtureServerApplication;
use anyhow::Result;

fn main() -> Result<()> {
    let app = FixtureServerApplication::new();
    let exit_code = app.run()?;
    std::process::exit(exit_code);
}
