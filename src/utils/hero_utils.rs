#![forbid(unsafe_code)]

use path_absolutize::Absolutize;
use std::ops::Deref;
use std::path::Path;

use poem::Request;
use poem::http::header::{AUTHORIZATION, COOKIE};
use log::{debug, LevelFilter};

// ***************************************************************************
// GENERAL PUBLIC FUNCTIONS
// ***************************************************************************
// ---------------------------------------------------------------------------
// get_absolute_path:
// ---------------------------------------------------------------------------
/** Replace tilde (~) and environment variable values in a path name and
 * then construct the absolute path name.  Unlike canonicalize, absolutize
 * does not require the file to exist.
 *
 * Any failure along the way returns the original path unchanged.
 */
pub fn get_absolute_path(path: &str) -> String {
    let s = match shellexpand::full(path) {
        Ok(x) => x,
        Err(_) => return path.to_owned(),
    };

    let p = Path::new(s.deref());
    let p1 = match p.absolutize() {
        Ok(x) => x,
        Err(_) => return path.to_owned(),
    };
    match p1.to_str() {
        Some(x) => x.to_owned(),
        None => path.to_owned(),
    }
}

// ***************************************************************************
// REQUEST LOGGING
// ***************************************************************************
// ---------------------------------------------------------------------------
// RequestDebug:
// ---------------------------------------------------------------------------
/** Request payloads implement this trait to describe themselves in the log. */
pub trait RequestDebug {
    fn get_request_info(&self) -> String;
}

// ---------------------------------------------------------------------------
// debug_request:
// ---------------------------------------------------------------------------
// Dump http request information to the log.
pub fn debug_request(http_req: &Request, req: &impl RequestDebug) {
    // Check that debug or higher logging is in effect.
    if log::max_level() < LevelFilter::Debug {
        return;
    }

    debug!("{}", format_request(http_req, req));
}

// ***************************************************************************
// PRIVATE FUNCTIONS
// ***************************************************************************
// ---------------------------------------------------------------------------
// format_request:
// ---------------------------------------------------------------------------
fn format_request(http_req: &Request, req: &impl RequestDebug) -> String {
    let mut s = "\n".to_string();

    // Restate the URI.
    let uri = http_req.uri();
    s += format!("  URI: {:?}\n", uri).as_str();

    // Accumulate the headers, keeping credentials out of the log.
    for (name, value) in http_req.headers().iter() {
        if *name == AUTHORIZATION || *name == COOKIE {
            s += format!("  Header: {} = <redacted>\n", name).as_str();
        } else {
            s += format!("  Header: {} = {:?}\n", name, value).as_str();
        }
    }

    // Add the request's information.
    s += req.get_request_info().as_str();
    s
}
