use chrono::{DateTime, Datelike, Utc};
use uuid::Uuid;

use crate::{
    dto::SampleInvitation,
    models::{Attendance, Invitation},
    money::Money,
};

const BRAND: &str = "Ethical Childrens Partys";
const ACCENT: &str = "#005c2f";

/// The parts of an invitation the emails talk about.
#[derive(Debug, Clone)]
pub struct EventSummary {
    pub id: Option<Uuid>,
    pub child_name: String,
    pub event_date: DateTime<Utc>,
    pub event_end_time: DateTime<Utc>,
    pub event_location: String,
    pub charity_name: String,
}

impl From<&Invitation> for EventSummary {
    fn from(invitation: &Invitation) -> Self {
        Self {
            id: Some(invitation.id),
            child_name: invitation.child_name.clone(),
            event_date: invitation.event_date,
            event_end_time: invitation.event_end_time,
            event_location: invitation.event_location.clone(),
            charity_name: invitation.charity_name.clone(),
        }
    }
}

impl From<SampleInvitation> for EventSummary {
    fn from(sample: SampleInvitation) -> Self {
        Self {
            id: sample.id,
            child_name: sample.child_name,
            event_date: sample.event_date,
            event_end_time: sample.event_end_time,
            event_location: sample.event_location,
            charity_name: sample.charity_name,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Notification {
    Invitation {
        event: EventSummary,
    },
    RsvpConfirmation {
        guest_name: String,
        attending: Attendance,
        event: EventSummary,
    },
    DonationConfirmation {
        donor_name: String,
        amount: Money,
        event: EventSummary,
    },
}

impl Notification {
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::Invitation { .. } => "invitation",
            Notification::RsvpConfirmation { .. } => "rsvp-confirmation",
            Notification::DonationConfirmation { .. } => "donation-confirmation",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn when(at: &DateTime<Utc>) -> String {
    at.format("%B %-d, %Y %-I:%M %p UTC").to_string()
}

fn header(frontend_url: &str) -> String {
    format!(
        r#"<div style="text-align: center; margin-bottom: 30px;">
  <img src="{frontend_url}/images/logo.svg" alt="{BRAND}" style="max-width: 300px; height: auto;" />
</div>
<div style="max-width: 600px; margin: 0 auto; padding: 20px; border-radius: 10px; box-shadow: 0 4px 8px rgba(0,0,0,0.1);">"#
    )
}

fn footer() -> String {
    format!(
        r#"</div>
<div style="text-align: center; margin-top: 30px; color: #666; font-size: 12px;">
  <p>&copy; {} {BRAND}. All rights reserved.</p>
</div>"#,
        Utc::now().year()
    )
}

pub fn render(notification: &Notification, frontend_url: &str) -> RenderedEmail {
    let (subject, body) = match notification {
        Notification::Invitation { event } => {
            let child = escape(&event.child_name);
            let charity = escape(&event.charity_name);
            let link = match event.id {
                Some(id) => format!("{frontend_url}/invitation/{id}"),
                None => frontend_url.to_string(),
            };
            let body = format!(
                r#"<h1 style="color: {ACCENT}; text-align: center;">You're Invited!</h1>
<p>You're invited to {child}'s party!</p>
<div style="margin: 20px 0;">
  <p><strong>When:</strong> {} to {}</p>
  <p><strong>Where:</strong> {}</p>
  <p><strong>Supporting:</strong> {charity}</p>
</div>
<p>Instead of bringing gifts, we're collecting donations for {charity}.</p>
<p>Click the link below to RSVP and contribute to the gift fund:</p>
<div style="text-align: center;">
  <a href="{link}" style="display: inline-block; padding: 10px 20px; background-color: {ACCENT}; color: white; text-decoration: none; border-radius: 5px; margin: 20px 0;">View Invitation &amp; RSVP</a>
</div>"#,
                when(&event.event_date),
                when(&event.event_end_time),
                escape(&event.event_location),
            );
            (format!("You're Invited to {}'s Party!", event.child_name), body)
        }
        Notification::RsvpConfirmation { guest_name, attending, event } => {
            let details = if attending.is_attending() {
                format!(
                    r#"<div style="margin: 20px 0;">
  <p><strong>Event Details:</strong></p>
  <p>Date &amp; Time: {} to {}</p>
  <p>Location: {}</p>
</div>"#,
                    when(&event.event_date),
                    when(&event.event_end_time),
                    escape(&event.event_location),
                )
            } else {
                String::new()
            };
            let response = if attending.is_attending() { "Attending" } else { "Not Attending" };
            let body = format!(
                r#"<h1 style="color: {ACCENT}; text-align: center;">RSVP Confirmation</h1>
<p>Dear {},</p>
<p>Thank you for your RSVP to {}'s party!</p>
<p><strong>Your Response:</strong> {response}</p>
{details}"#,
                escape(guest_name),
                escape(&event.child_name),
            );
            (format!("RSVP Confirmation - {}'s Party", event.child_name), body)
        }
        Notification::DonationConfirmation { donor_name, amount, event } => {
            let body = format!(
                r#"<h1 style="color: {ACCENT}; text-align: center;">Thank You for Your Donation!</h1>
<p>Dear {},</p>
<p>Thank you for your generous donation of ${amount} to {} in celebration of {}'s party!</p>
<p>Your contribution will make a real difference.</p>"#,
                escape(donor_name),
                escape(&event.charity_name),
                escape(&event.child_name),
            );
            (format!("Donation Confirmation - {}'s Party", event.child_name), body)
        }
    };
    RenderedEmail {
        subject,
        html: format!("{}\n{}\n{}", header(frontend_url), body, footer()),
    }
}
