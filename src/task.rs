//! Async driver that connects a [`Session`] to an `embedded-io-async`
//! transport.
//!
//! The session itself never awaits: it writes into a [`BufferedSink`],
//! and the driver forwards those bytes to the transport after every input
//! byte.

use embassy_futures::select::{select, Either};
use embassy_sync::{blocking_mutex::raw::RawMutex, signal::Signal};
use embedded_io_async::{Read, Write as AsyncWrite};
use thiserror::Error;

use crate::config::RECEIVE_BUFFER_SIZE;
use crate::session::Session;
use crate::writer::BufferedSink;

/// Errors that end the driver loop
#[derive(Debug, Error)]
pub enum TaskError<R, W> {
    /// Reading from the transport failed
    #[error("read failed: {0:?}")]
    Read(R),
    /// Writing to the transport failed
    #[error("write failed: {0:?}")]
    Write(W),
}

/// Run the shell until the input reports end of file.
///
/// Prints the banner and prompt, then feeds every received byte through
/// the session. When `redraw_signal` fires, the prompt line is redrawn;
/// signal it after printing from another task.
pub async fn run<R, W, M, const OUT: usize, const BUF_SIZE: usize, const HISTORY: usize>(
    session: &mut Session<BufferedSink<OUT>, BUF_SIZE, HISTORY>,
    reader: &mut R,
    writer: &mut W,
    redraw_signal: Option<&Signal<M, ()>>,
) -> Result<(), TaskError<R::Error, W::Error>>
where
    R: Read,
    W: AsyncWrite,
    M: RawMutex,
{
    session.start();
    flush(session, writer).await.map_err(TaskError::Write)?;

    let mut chunk = [0u8; RECEIVE_BUFFER_SIZE];
    loop {
        let read = if let Some(signal) = redraw_signal {
            match select(reader.read(&mut chunk), signal.wait()).await {
                Either::First(read) => read,
                Either::Second(()) => {
                    signal.reset();
                    session.redraw_line();
                    flush(session, writer).await.map_err(TaskError::Write)?;
                    continue;
                }
            }
        } else {
            reader.read(&mut chunk).await
        };

        let len = read.map_err(TaskError::Read)?;
        if len == 0 {
            log::info!("input closed, shell stopped");
            return Ok(());
        }
        for &byte in &chunk[..len] {
            session.process_byte(byte);
            flush(session, writer).await.map_err(TaskError::Write)?;
        }
    }
}

async fn flush<W, const OUT: usize, const BUF_SIZE: usize, const HISTORY: usize>(
    session: &mut Session<BufferedSink<OUT>, BUF_SIZE, HISTORY>,
    writer: &mut W,
) -> Result<(), W::Error>
where
    W: AsyncWrite,
{
    let sink = session.sink_mut();
    if sink.pending().is_empty() {
        return Ok(());
    }
    writer.write_all(sink.pending()).await?;
    sink.clear();
    writer.flush().await
}
