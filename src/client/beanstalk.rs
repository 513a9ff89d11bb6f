//! beanstalkd text protocol over TCP.
//!
//! Requests are single CRLF-terminated lines (plus a body for `put`); replies
//! are a status line optionally followed by `<bytes>` of data and a CRLF.

use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, ErrorKind, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use serde::de::DeserializeOwned;

use super::{
    validate_tube_name, Connector, Job, JobState, PutOptions, QueueClient, Stats, DEFAULT_TUBE,
};
use crate::error::ProtocolError;
use crate::{blog_debug, blog_trace, Error, Result};

/// Largest reply body accepted from the server. Well above beanstalkd's
/// default max-job-size of 65535 bytes, and large enough for `stats` and
/// `list-tubes` on busy servers.
pub const MAX_DATA_LEN: usize = 16 * 1024 * 1024;

pub struct BeanstalkClient<R, W> {
    reader: R,
    writer: W,
    used: String,
}

impl BeanstalkClient<BufReader<TcpStream>, TcpStream> {
    /// Dial `host:port`, trying each resolved address until one answers
    /// within `timeout`.
    pub fn dial(host: &str, port: u16, timeout: Duration) -> Result<Self> {
        let address = format!("{}:{}", host, port);
        let connection_error = |source| Error::Connection {
            address: address.clone(),
            source,
        };

        let mut last_err = std::io::Error::new(ErrorKind::NotFound, "no addresses resolved");
        let addrs = (host, port).to_socket_addrs().map_err(connection_error)?;
        for addr in addrs {
            blog_debug!("Dialing {} ({}) timeout={:?}", address, addr, timeout);
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    let reader = BufReader::new(stream.try_clone()?);
                    return Ok(Self::new(reader, stream));
                }
                Err(e) => last_err = e,
            }
        }
        Err(connection_error(last_err))
    }
}

impl<R: BufRead, W: Write> BeanstalkClient<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            used: DEFAULT_TUBE.to_string(),
        }
    }

    fn send(&mut self, line: &str, body: Option<&[u8]>) -> Result<()> {
        blog_trace!(">> {}", line);
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\r\n")?;
        if let Some(body) = body {
            self.writer.write_all(body)?;
            self.writer.write_all(b"\r\n")?;
        }
        self.writer.flush()?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Err(Error::Io(std::io::Error::new(
                ErrorKind::UnexpectedEof,
                "server closed the connection",
            )));
        }
        let line = line.trim_end_matches(['\r', '\n']).to_string();
        blog_trace!("<< {}", line);
        Ok(line)
    }

    fn read_data(&mut self, len: usize) -> Result<Vec<u8>> {
        let total = len
            .checked_add(2)
            .filter(|_| len <= MAX_DATA_LEN)
            .ok_or_else(|| {
                ProtocolError::Unexpected(format!(
                    "server announced {} bytes of data, limit is {}",
                    len, MAX_DATA_LEN
                ))
            })?;
        let mut data = vec![0u8; total];
        self.reader.read_exact(&mut data)?;
        if !data.ends_with(b"\r\n") {
            return Err(ProtocolError::Unexpected("job data missing trailing CRLF".to_string()).into());
        }
        data.truncate(len);
        Ok(data)
    }

    fn request(&mut self, line: &str) -> Result<String> {
        self.send(line, None)?;
        self.read_line()
    }

    /// Split `reply` into its arguments if it starts with `expected`,
    /// otherwise turn the status into a protocol error.
    fn expect<'a>(reply: &'a str, expected: &str) -> Result<Vec<&'a str>> {
        let mut words = reply.split_whitespace();
        match words.next() {
            Some(status) if status == expected => Ok(words.collect()),
            _ => Err(ProtocolError::from_status(reply).into()),
        }
    }

    fn number<T: std::str::FromStr>(reply: &str, word: Option<&&str>) -> Result<T> {
        word.and_then(|w| w.parse().ok())
            .ok_or_else(|| ProtocolError::Unexpected(reply.to_string()).into())
    }

    fn read_job(&mut self, reply: &str, expected: &str) -> Result<Job> {
        let args = Self::expect(reply, expected)?;
        let id = Self::number(reply, args.first())?;
        let len = Self::number(reply, args.get(1))?;
        let body = self.read_data(len)?;
        Ok(Job { id, body })
    }

    fn read_yaml<T: DeserializeOwned>(&mut self, reply: &str) -> Result<T> {
        let args = Self::expect(reply, "OK")?;
        let len = Self::number(reply, args.first())?;
        let data = self.read_data(len)?;
        Ok(serde_yaml::from_slice(&data)?)
    }

    fn read_stats(&mut self, reply: &str) -> Result<Stats> {
        let raw: BTreeMap<String, serde_yaml::Value> = self.read_yaml(reply)?;
        Ok(raw
            .into_iter()
            .map(|(key, value)| (key, scalar_to_string(value)))
            .collect())
    }

    fn ensure_used(&mut self, tube: &str) -> Result<()> {
        if self.used != tube {
            self.use_tube(tube)?;
        }
        Ok(())
    }
}

fn scalar_to_string(value: serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => String::new(),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

impl<R: BufRead, W: Write> QueueClient for BeanstalkClient<R, W> {
    fn used_tube(&mut self) -> Result<String> {
        let reply = self.request("list-tube-used")?;
        let args = Self::expect(&reply, "USING")?;
        let tube = args
            .first()
            .ok_or_else(|| ProtocolError::Unexpected(reply.clone()))?
            .to_string();
        self.used = tube.clone();
        Ok(tube)
    }

    fn use_tube(&mut self, tube: &str) -> Result<()> {
        validate_tube_name(tube)?;
        let reply = self.request(&format!("use {}", tube))?;
        Self::expect(&reply, "USING")?;
        self.used = tube.to_string();
        Ok(())
    }

    fn put(&mut self, body: &[u8], options: PutOptions) -> Result<u64> {
        let line = format!(
            "put {} {} {} {}",
            options.priority,
            options.delay.as_secs(),
            options.ttr.as_secs(),
            body.len()
        );
        self.send(&line, Some(body))?;
        let reply = self.read_line()?;
        if let Ok(args) = Self::expect(&reply, "BURIED") {
            return Err(ProtocolError::Buried(Self::number(&reply, args.first())?).into());
        }
        let args = Self::expect(&reply, "INSERTED")?;
        Self::number(&reply, args.first())
    }

    fn peek(&mut self, tube: &str, state: JobState) -> Result<Job> {
        self.ensure_used(tube)?;
        let reply = self.request(state.peek_verb())?;
        self.read_job(&reply, "FOUND")
    }

    fn peek_job(&mut self, id: u64) -> Result<Vec<u8>> {
        let reply = self.request(&format!("peek {}", id))?;
        Ok(self.read_job(&reply, "FOUND")?.body)
    }

    fn delete(&mut self, id: u64) -> Result<()> {
        let reply = self.request(&format!("delete {}", id))?;
        Self::expect(&reply, "DELETED")?;
        Ok(())
    }

    /// Only reserved jobs can be buried, so the job is reserved by id first.
    fn bury(&mut self, id: u64, priority: u32) -> Result<()> {
        let reply = self.request(&format!("reserve-job {}", id))?;
        self.read_job(&reply, "RESERVED")?;
        let reply = self.request(&format!("bury {} {}", id, priority))?;
        Self::expect(&reply, "BURIED")?;
        Ok(())
    }

    fn kick(&mut self, tube: &str, bound: u64) -> Result<u64> {
        self.ensure_used(tube)?;
        let reply = self.request(&format!("kick {}", bound))?;
        let args = Self::expect(&reply, "KICKED")?;
        Self::number(&reply, args.first())
    }

    fn list_tubes(&mut self) -> Result<Vec<String>> {
        let reply = self.request("list-tubes")?;
        self.read_yaml(&reply)
    }

    fn stats(&mut self) -> Result<Stats> {
        let reply = self.request("stats")?;
        self.read_stats(&reply)
    }

    fn stats_tube(&mut self, tube: &str) -> Result<Stats> {
        validate_tube_name(tube)?;
        let reply = self.request(&format!("stats-tube {}", tube))?;
        self.read_stats(&reply)
    }

    fn stats_job(&mut self, id: u64) -> Result<Stats> {
        let reply = self.request(&format!("stats-job {}", id))?;
        self.read_stats(&reply)
    }

    fn close(&mut self) -> Result<()> {
        // The server hangs up on `quit` without replying
        self.send("quit", None)
    }
}

/// Dials real servers over TCP.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    fn connect(&self, host: &str, port: u16, timeout: Duration) -> Result<Box<dyn QueueClient>> {
        Ok(Box::new(BeanstalkClient::dial(host, port, timeout)?))
    }
}
