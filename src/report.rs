use crate::config::Settings;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::{Message, SmtpTransport, Transport};
use std::io;

const SUBJECT_OK: &str = "Appliance Backup Report";
const SUBJECT_ERROR: &str = "Appliance Backup Report: Errors Detected";

/// One of the two mutually exclusive run reports, plus the abort notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub subject: String,
    pub body_html: String,
}

fn body_with(cell: &str) -> String {
    let mut body =
        String::from(r#"<table width="75%" cellpadding="1" cellspacing="0" border="1">"#);
    body.push_str("<tr><td><b>Appliance Backup Report</b></td></tr>");
    body.push_str("<tr>");
    body.push_str(cell);
    body.push_str("</tr></table>");
    body
}

pub fn success(staged_name: &str, deleted: usize) -> Report {
    Report {
        subject: SUBJECT_OK.to_string(),
        body_html: body_with(&format!(
            "<td>Backups are up-to-date. Staged {}; removed {} stale file(s).</td>",
            staged_name, deleted
        )),
    }
}

pub fn low_count(expected: usize, actual: usize) -> Report {
    Report {
        subject: SUBJECT_ERROR.to_string(),
        body_html: body_with(&format!(
            r#"<td><font color="red">ERROR: Expected {} backup files, got {}</font></td>"#,
            expected, actual
        )),
    }
}

pub fn run_failure(error: &io::Error) -> Report {
    Report {
        subject: SUBJECT_ERROR.to_string(),
        body_html: body_with(&format!(
            r#"<td><font color="red">ERROR: Backup run aborted: {}</font></td>"#,
            error
        )),
    }
}

/// Mail seam; the SMTP implementation is best-effort with no delivery tracking.
pub trait MailSender {
    fn send(&self, report: &Report) -> io::Result<()>;
}

pub struct SmtpMailer<'a> {
    settings: &'a Settings,
}

impl<'a> SmtpMailer<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        SmtpMailer { settings }
    }
}

impl MailSender for SmtpMailer<'_> {
    fn send(&self, report: &Report) -> io::Result<()> {
        let from: Mailbox = self.settings.smtp_from.parse().map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Invalid sender address: {}", e),
            )
        })?;

        let mut builder = Message::builder().from(from).subject(report.subject.as_str());
        for recipient in &self.settings.smtp_recipients {
            let to: Mailbox = recipient.parse().map_err(|e| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("Invalid recipient address: {}", e),
                )
            })?;
            builder = builder.to(to);
        }

        let message = builder
            .header(ContentType::TEXT_HTML)
            .body(report.body_html.clone())
            .map_err(|e| {
                io::Error::new(
                    io::ErrorKind::Other,
                    format!("Failed to build report message: {}", e),
                )
            })?;

        // Plain relay, matching the internal mail hub this posts to.
        let mailer = SmtpTransport::builder_dangerous(self.settings.smtp_server.as_str())
            .port(self.settings.smtp_port)
            .build();

        mailer.send(&message).map_err(|e| {
            println!("Failed to dispatch report: {:?}", e);
            io::Error::new(io::ErrorKind::Other, "Failed to dispatch report")
        })?;

        println!(
            "Report \"{}\" dispatched to {} recipient(s).",
            report.subject,
            self.settings.smtp_recipients.len()
        );
        Ok(())
    }
}
