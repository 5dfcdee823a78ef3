//! The two subcommands: `make_base` builds and freezes a catalogue, and
//! `process_requests` answers stat queries against a frozen one.

use std::fs::File;
use std::io::{self, Read, Write};

use crate::catalogue::Catalogue;
use crate::codec;
use crate::error::Error;
use crate::requests::{self, MakeBaseInput, ProcessRequestsInput};
use crate::router::TransitRouter;

fn read_stdin_to_string() -> Result<String, Error> {
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

pub fn make_base() -> Result<(), Error> {
    let raw = read_stdin_to_string()?;
    let input: MakeBaseInput = serde_json::from_str(&raw)?;
    input.render_settings.validate()?;

    let mut catalogue = Catalogue::new();
    requests::apply_base_requests(&mut catalogue, &input.base_requests)?;
    catalogue.print_stats();

    let router = TransitRouter::build(&catalogue, &input.routing_settings)?;

    let mut file = File::create(&input.serialization_settings.file)?;
    codec::write(
        &mut file,
        &catalogue,
        &input.render_settings,
        &input.routing_settings,
        &router,
    )?;

    log::info!(
        "wrote archive to {}",
        input.serialization_settings.file.display()
    );
    Ok(())
}

pub fn process_requests() -> Result<(), Error> {
    let raw = read_stdin_to_string()?;
    let input: ProcessRequestsInput = serde_json::from_str(&raw)?;

    let mut file = File::open(&input.serialization_settings.file)?;
    let archive = codec::read(&mut file)?;

    let responses: Vec<serde_json::Value> = input
        .stat_requests
        .iter()
        .map(|req| {
            requests::answer(
                req,
                &archive.catalogue,
                &archive.router,
                &archive.render_settings,
            )
        })
        .collect();

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    serde_json::to_writer_pretty(&mut handle, &responses)?;
    handle.write_all(b"\n")?;
    Ok(())
}
