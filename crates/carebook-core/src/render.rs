use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use carebook_shared::{Appointment, AppointmentStatus, PHYSICIANS};
use unicode_width::UnicodeWidthStr;

use crate::config::{Config, KEY_COLOR};
use crate::datastore::Notification;
use crate::datetime::{format_schedule, format_timestamp};

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get(KEY_COLOR).unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self { color })
    }

    #[tracing::instrument(skip(self, appointments))]
    pub fn print_appointment_table(&mut self, appointments: &[Appointment]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        if appointments.is_empty() {
            writeln!(out, "No appointments.")?;
            return Ok(());
        }

        let headers = vec![
            "ID".to_string(),
            "Patient".to_string(),
            "Schedule".to_string(),
            "Doctor".to_string(),
            "Status".to_string(),
            "Reason".to_string(),
        ];

        let rows = appointments
            .iter()
            .map(|appointment| {
                let short_id = appointment.id.to_string()[..8].to_string();
                vec![
                    self.paint(&short_id, "33"),
                    appointment.patient_id.clone(),
                    format_schedule(appointment.schedule),
                    format!("Dr. {}", appointment.primary_physician),
                    self.paint_status(appointment.status),
                    appointment.reason.clone(),
                ]
            })
            .collect();

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    #[tracing::instrument(skip(self, appointment), fields(appointment_id = %appointment.id))]
    pub fn print_appointment_info(&mut self, appointment: &Appointment) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        writeln!(out, "id           {}", appointment.id)?;
        writeln!(out, "status       {}", self.paint_status(appointment.status))?;
        writeln!(out, "patient      {}", appointment.patient_id)?;
        writeln!(out, "user         {}", appointment.user_id)?;
        writeln!(out, "doctor       Dr. {}", appointment.primary_physician)?;
        writeln!(out, "schedule     {}", format_schedule(appointment.schedule))?;
        writeln!(out, "reason       {}", appointment.reason)?;
        if let Some(note) = appointment.note.as_deref() {
            writeln!(out, "note         {note}")?;
        }
        if let Some(reason) = appointment.cancellation_reason.as_deref() {
            writeln!(out, "cancelled    {reason}")?;
        }
        writeln!(out, "created      {}", format_timestamp(appointment.created_at))?;
        writeln!(out, "modified     {}", format_timestamp(appointment.updated_at))?;

        Ok(())
    }

    pub fn print_physicians(&mut self) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        for doctor in PHYSICIANS {
            writeln!(out, "Dr. {:<20} {}", doctor.name, doctor.image)?;
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, notifications))]
    pub fn print_notifications(&mut self, notifications: &[Notification]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        if notifications.is_empty() {
            writeln!(out, "No notifications.")?;
            return Ok(());
        }

        let headers = vec![
            "Sent".to_string(),
            "Patient".to_string(),
            "Kind".to_string(),
            "Message".to_string(),
        ];
        let rows = notifications
            .iter()
            .map(|notice| {
                vec![
                    format_timestamp(notice.created_at),
                    notice.patient_id.clone(),
                    notice.kind.clone(),
                    notice.message.clone(),
                ]
            })
            .collect();

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    fn paint_status(&self, status: AppointmentStatus) -> String {
        let code = match status {
            AppointmentStatus::Pending => "36",
            AppointmentStatus::Scheduled => "32",
            AppointmentStatus::Cancelled => "31",
        };
        self.paint(status.as_str(), code)
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let mut widths: Vec<usize> = headers
        .iter()
        .map(|header| UnicodeWidthStr::width(header.as_str()))
        .collect();

    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for (header, width) in headers.iter().zip(widths.iter().copied()) {
        write!(writer, "{header:width$} ")?;
    }
    writeln!(writer)?;

    for width in widths.iter().copied() {
        write!(writer, "{:-<width$} ", "")?;
    }
    writeln!(writer)?;

    for row in rows {
        for (cell, width) in row.iter().zip(&widths) {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = width.saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::{strip_ansi, write_table};

    #[test]
    fn table_pads_by_visible_width() {
        let mut buf = Vec::new();
        write_table(
            &mut buf,
            vec!["ID".to_string(), "Doctor".to_string()],
            vec![
                vec!["\x1b[33mab\x1b[0m".to_string(), "Dr. Hardik Sharma".to_string()],
                vec!["c".to_string(), "Dr. Jasmine Lee".to_string()],
            ],
        )
        .expect("write table");

        let text = String::from_utf8(buf).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "ID Doctor            ");
        assert_eq!(lines[1], "-- ----------------- ");
        assert_eq!(strip_ansi(lines[2]), "ab Dr. Hardik Sharma ");
        assert_eq!(lines[3], "c  Dr. Jasmine Lee   ");
    }
}
