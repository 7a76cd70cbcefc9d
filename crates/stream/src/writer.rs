//! Adapters so a stream can stand wherever a byte writer is expected
//!
//! Each `write` call becomes exactly one record. Logging front-ends that
//! format a whole line before writing (such as `tracing_subscriber::fmt`)
//! therefore ship one event per record.
//!
//! ```ignore
//! let stream = DeliveryStream::new(StreamConfig::new("app-logs"), sink)?;
//!
//! tracing_subscriber::fmt()
//!     .json()
//!     .with_writer(stream.clone())
//!     .init();
//! ```

use std::io;

use tracing_subscriber::fmt::MakeWriter;

use crate::stream::DeliveryStream;

impl io::Write for DeliveryStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.write_record(buf))
    }

    /// Buffered records leave on the stream's own schedule
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl io::Write for &DeliveryStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.write_record(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for DeliveryStream {
    type Writer = DeliveryStream;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
