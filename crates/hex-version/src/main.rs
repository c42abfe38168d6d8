use std::io::{self, Read};

use anyhow::{Context, Result};

fn main() -> Result<()> {
    env_logger::init();

    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("failed to read version from stdin")?;
    log::debug!("Encoding version {:?}", input.trim());

    let hex = nmea_replay::encode_hex(&input)?;
    println!("{}", hex);

    Ok(())
}
