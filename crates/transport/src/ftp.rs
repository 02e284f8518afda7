//! Minimal FTP retrieval client.
//!
//! Implements just enough of RFC 959 for anonymous binary downloads:
//! login, `TYPE I`, `PASV`, then `RETR` or `NLST`. The control and data
//! connections live for one operation; the caller bounds the whole exchange
//! with a timeout, and dropping the future closes both sockets.

use crate::error::FetchFailure;
use bytes::Bytes;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

const DEFAULT_FTP_PORT: u16 = 21;

/// Download a file from an `ftp://` URL.
pub async fn fetch_bytes(url: &str) -> Result<Bytes, FetchFailure> {
    let (host, port, path) = split_url(url)?;
    let mut session = FtpSession::connect(&host, port).await?;
    let payload = session.retrieve(&path).await?;
    session.quit().await;

    if payload.is_empty() {
        return Err(FetchFailure::EmptyBody);
    }
    Ok(payload)
}

/// List file names under an `ftp://` directory URL.
pub async fn list_names(url: &str) -> Result<Vec<String>, FetchFailure> {
    let (host, port, path) = split_url(url)?;
    let mut session = FtpSession::connect(&host, port).await?;
    let listing = session.name_list(&path).await?;
    session.quit().await;

    Ok(listing
        .lines()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect())
}

/// Split `ftp://host[:port]/path` into its parts.
fn split_url(url: &str) -> Result<(String, u16, String), FetchFailure> {
    let rest = url
        .strip_prefix("ftp://")
        .ok_or_else(|| FetchFailure::Protocol(format!("not an ftp URL: {}", url)))?;

    let (authority, path) = match rest.find('/') {
        Some(slash) => (&rest[..slash], &rest[slash..]),
        None => (rest, "/"),
    };

    let (host, port) = match authority.rsplit_once(':') {
        Some((host, port)) => {
            let port = port
                .parse::<u16>()
                .map_err(|_| FetchFailure::Protocol(format!("bad ftp port in {}", url)))?;
            (host, port)
        }
        None => (authority, DEFAULT_FTP_PORT),
    };

    if host.is_empty() {
        return Err(FetchFailure::Protocol(format!("missing ftp host in {}", url)));
    }

    Ok((host.to_string(), port, path.to_string()))
}

struct FtpSession {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl FtpSession {
    async fn connect(host: &str, port: u16) -> Result<Self, FetchFailure> {
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(|e| FetchFailure::Connect(e.to_string()))?;
        let (read, writer) = stream.into_split();
        let mut session = Self {
            reader: BufReader::new(read),
            writer,
        };

        session.expect_reply(220).await?;
        session.command("USER anonymous").await?;
        let code = session.read_reply().await?.0;
        if code == 331 {
            session.command("PASS anonymous@").await?;
            session.expect_reply(230).await?;
        } else if code != 230 {
            return Err(FetchFailure::Status(code));
        }
        session.command("TYPE I").await?;
        session.expect_reply(200).await?;

        Ok(session)
    }

    async fn retrieve(&mut self, path: &str) -> Result<Bytes, FetchFailure> {
        self.transfer(&format!("RETR {}", path)).await.map(Bytes::from)
    }

    async fn name_list(&mut self, path: &str) -> Result<String, FetchFailure> {
        let raw = self.transfer(&format!("NLST {}", path)).await?;
        String::from_utf8(raw)
            .map_err(|_| FetchFailure::Protocol("listing is not valid UTF-8".to_string()))
    }

    /// Run one data-connection command: open the passive socket, issue the
    /// command, drain the data stream, then confirm transfer completion.
    async fn transfer(&mut self, command: &str) -> Result<Vec<u8>, FetchFailure> {
        let data_addr = self.enter_passive().await?;
        let mut data = TcpStream::connect(data_addr)
            .await
            .map_err(|e| FetchFailure::Connect(e.to_string()))?;

        self.command(command).await?;
        let (code, _) = self.read_reply().await?;
        if code != 150 && code != 125 {
            return Err(FetchFailure::Status(code));
        }

        let mut payload = Vec::new();
        data.read_to_end(&mut payload)
            .await
            .map_err(|e| FetchFailure::Protocol(e.to_string()))?;
        drop(data);

        self.expect_reply(226).await?;
        Ok(payload)
    }

    async fn enter_passive(&mut self) -> Result<(String, u16), FetchFailure> {
        self.command("PASV").await?;
        let (code, line) = self.read_reply().await?;
        if code != 227 {
            return Err(FetchFailure::Status(code));
        }
        parse_pasv(&line)
    }

    async fn quit(&mut self) {
        // Best-effort goodbye; the connection drops either way.
        let _ = self.command("QUIT").await;
        let _ = self.read_reply().await;
    }

    async fn command(&mut self, command: &str) -> Result<(), FetchFailure> {
        self.writer
            .write_all(format!("{}\r\n", command).as_bytes())
            .await
            .map_err(|e| FetchFailure::Protocol(e.to_string()))
    }

    /// Read one reply and require its code to match `expected`.
    async fn expect_reply(&mut self, expected: u16) -> Result<String, FetchFailure> {
        let (code, line) = self.read_reply().await?;
        if code != expected {
            return Err(FetchFailure::Status(code));
        }
        Ok(line)
    }

    /// Read one reply, skipping continuation lines of multi-line replies.
    async fn read_reply(&mut self) -> Result<(u16, String), FetchFailure> {
        loop {
            let mut line = String::new();
            let n = self
                .reader
                .read_line(&mut line)
                .await
                .map_err(|e| FetchFailure::Protocol(e.to_string()))?;
            if n == 0 {
                return Err(FetchFailure::Protocol(
                    "control connection closed".to_string(),
                ));
            }

            // Final reply lines are "NNN text"; "NNN-text" continues.
            if line.len() >= 4 && line.as_bytes()[3] == b' ' {
                if let Some(code) = line.get(..3).and_then(|c| c.parse::<u16>().ok()) {
                    return Ok((code, line.trim_end().to_string()));
                }
            }
        }
    }
}

/// Parse the `(h1,h2,h3,h4,p1,p2)` tuple of a 227 reply.
fn parse_pasv(line: &str) -> Result<(String, u16), FetchFailure> {
    let open = line.find('(');
    let close = line.rfind(')');
    let inner = match (open, close) {
        (Some(open), Some(close)) if close > open => &line[open + 1..close],
        _ => {
            return Err(FetchFailure::Protocol(format!(
                "malformed PASV reply: {}",
                line
            )))
        }
    };

    let fields: Vec<u16> = inner
        .split(',')
        .map(|f| f.trim().parse::<u16>())
        .collect::<Result<_, _>>()
        .map_err(|_| FetchFailure::Protocol(format!("malformed PASV reply: {}", line)))?;

    if fields.len() != 6 || fields[..4].iter().any(|&f| f > 255) || fields[4] > 255 || fields[5] > 255
    {
        return Err(FetchFailure::Protocol(format!(
            "malformed PASV reply: {}",
            line
        )));
    }

    let host = format!("{}.{}.{}.{}", fields[0], fields[1], fields[2], fields[3]);
    let port = fields[4] * 256 + fields[5];
    Ok((host, port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_url_defaults_port() {
        let (host, port, path) = split_url("ftp://tgftp.nws.noaa.gov/SL.us008001/file.ar2v").unwrap();
        assert_eq!(host, "tgftp.nws.noaa.gov");
        assert_eq!(port, 21);
        assert_eq!(path, "/SL.us008001/file.ar2v");
    }

    #[test]
    fn test_split_url_explicit_port_and_bare_host() {
        let (host, port, path) = split_url("ftp://example.com:2121").unwrap();
        assert_eq!(host, "example.com");
        assert_eq!(port, 2121);
        assert_eq!(path, "/");
    }

    #[test]
    fn test_split_url_rejects_other_schemes() {
        assert!(split_url("http://example.com/x").is_err());
    }

    #[test]
    fn test_parse_pasv_reply() {
        let (host, port) =
            parse_pasv("227 Entering Passive Mode (192,168,1,10,19,136).").unwrap();
        assert_eq!(host, "192.168.1.10");
        assert_eq!(port, 19 * 256 + 136);
    }

    #[test]
    fn test_parse_pasv_rejects_garbage() {
        assert!(parse_pasv("227 no tuple here").is_err());
        assert!(parse_pasv("227 (1,2,3)").is_err());
        assert!(parse_pasv("227 (300,2,3,4,5,6)").is_err());
    }
}
