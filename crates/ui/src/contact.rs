//! Contact form overlay.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use folio_core::{ContactMessage, ContactService, Language, TextKey};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::theme::Palette;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum ContactField {
    #[default]
    Name,
    Email,
    Message,
}

impl ContactField {
    fn next(self) -> Self {
        match self {
            ContactField::Name => ContactField::Email,
            ContactField::Email => ContactField::Message,
            ContactField::Message => ContactField::Name,
        }
    }

    fn prev(self) -> Self {
        match self {
            ContactField::Name => ContactField::Message,
            ContactField::Email => ContactField::Name,
            ContactField::Message => ContactField::Email,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ContactStatus {
    Sent(i64),
    Rejected(String),
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ContactForm {
    pub open: bool,
    pub focus: ContactField,
    pub name: String,
    pub email: String,
    pub message: String,
    pub status: Option<ContactStatus>,
}

impl ContactForm {
    pub(crate) fn open(&mut self) {
        self.open = true;
        self.focus = ContactField::Name;
        self.status = None;
    }

    fn field_mut(&mut self) -> &mut String {
        match self.focus {
            ContactField::Name => &mut self.name,
            ContactField::Email => &mut self.email,
            ContactField::Message => &mut self.message,
        }
    }

    /// Handles a key while the form is open.
    pub(crate) fn handle_key(&mut self, key: KeyEvent, service: &mut dyn ContactService) {
        match key.code {
            KeyCode::Esc => self.open = false,
            KeyCode::Tab | KeyCode::Down => self.focus = self.focus.next(),
            KeyCode::BackTab | KeyCode::Up => self.focus = self.focus.prev(),
            KeyCode::Backspace => {
                self.field_mut().pop();
            }
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::ALT) => {
                if self.focus == ContactField::Message {
                    self.message.push('\n');
                }
            }
            KeyCode::Enter => {
                if self.focus == ContactField::Message {
                    self.submit(service);
                } else {
                    self.focus = self.focus.next();
                }
            }
            KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.submit(service);
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.field_mut().push(c);
            }
            _ => {}
        }
    }

    pub(crate) fn submit(&mut self, service: &mut dyn ContactService) {
        let result = ContactMessage::new(&self.name, &self.email, &self.message)
            .and_then(|message| service.submit(&message));
        match result {
            Ok(receipt) => {
                self.status = Some(ContactStatus::Sent(receipt.id));
                self.message.clear();
            }
            Err(err) => {
                log::warn!("contact form rejected: {err}");
                self.status = Some(ContactStatus::Rejected(err.to_string()));
            }
        }
    }

    pub(crate) fn draw(
        &self,
        area: Rect,
        frame: &mut ratatui::Frame,
        language: Language,
        palette: &Palette,
    ) {
        let popup = crate::centered_rect(60, 60, area);
        frame.render_widget(Clear, popup);
        let block = Block::default().borders(Borders::ALL).title(Span::styled(
            language.text(TextKey::ContactTitle),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        frame.render_widget(block.clone(), popup);
        let inner = block.inner(popup);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(3),
                Constraint::Length(2),
            ])
            .split(inner);

        let fields = [
            (ContactField::Name, TextKey::ContactName, &self.name),
            (ContactField::Email, TextKey::ContactEmail, &self.email),
            (ContactField::Message, TextKey::ContactMessage, &self.message),
        ];
        for ((field, label, value), row) in fields.into_iter().zip(rows.iter()) {
            let focused = field == self.focus;
            let border = if focused {
                Style::default().fg(palette.accent).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(palette.muted)
            };
            let mut content = value.clone();
            if focused {
                content.push('▏');
            }
            let input = Paragraph::new(content)
                .wrap(Wrap { trim: false })
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(border)
                        .title(language.text(label)),
                );
            frame.render_widget(input, *row);
        }

        let status = match &self.status {
            Some(ContactStatus::Sent(_)) => Line::styled(
                language.text(TextKey::ContactSent),
                Style::default().fg(palette.accent),
            ),
            Some(ContactStatus::Rejected(reason)) => Line::styled(
                format!("{}: {reason}", language.text(TextKey::ContactFailed)),
                Style::default().fg(palette.error),
            ),
            None => Line::from(vec![
                Span::styled("Tab", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" next  "),
                Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" send  "),
                Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" close"),
            ]),
        };
        frame.render_widget(Paragraph::new(Text::from(status)), rows[3]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::{ContactError, ContactReceipt};

    #[derive(Default)]
    struct Recorder {
        sent: Vec<ContactMessage>,
    }

    impl ContactService for Recorder {
        fn submit(&mut self, message: &ContactMessage) -> Result<ContactReceipt, ContactError> {
            self.sent.push(message.clone());
            Ok(ContactReceipt {
                id: self.sent.len() as i64,
            })
        }
    }

    fn type_text(form: &mut ContactForm, service: &mut Recorder, text: &str) {
        for c in text.chars() {
            form.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE), service);
        }
    }

    fn press(form: &mut ContactForm, service: &mut Recorder, code: KeyCode) {
        form.handle_key(KeyEvent::new(code, KeyModifiers::NONE), service);
    }

    #[test]
    fn filling_every_field_submits_once() {
        let mut form = ContactForm::default();
        let mut service = Recorder::default();
        form.open();
        type_text(&mut form, &mut service, "Ada");
        press(&mut form, &mut service, KeyCode::Enter);
        type_text(&mut form, &mut service, "ada@example.org");
        press(&mut form, &mut service, KeyCode::Tab);
        type_text(&mut form, &mut service, "hello");
        press(&mut form, &mut service, KeyCode::Enter);

        assert_eq!(form.status, Some(ContactStatus::Sent(1)));
        assert_eq!(service.sent.len(), 1);
        assert_eq!(service.sent[0].email(), "ada@example.org");
        assert!(form.message.is_empty());
    }

    #[test]
    fn invalid_email_is_reported_and_not_sent() {
        let mut form = ContactForm::default();
        let mut service = Recorder::default();
        form.open();
        form.name = "Ada".into();
        form.email = "nope".into();
        form.message = "hi".into();
        form.submit(&mut service);

        assert!(matches!(form.status, Some(ContactStatus::Rejected(_))));
        assert!(service.sent.is_empty());
        assert_eq!(form.message, "hi");
    }

    #[test]
    fn backspace_and_focus_cycle() {
        let mut form = ContactForm::default();
        let mut service = Recorder::default();
        form.open();
        type_text(&mut form, &mut service, "Adx");
        press(&mut form, &mut service, KeyCode::Backspace);
        assert_eq!(form.name, "Ad");
        press(&mut form, &mut service, KeyCode::BackTab);
        assert_eq!(form.focus, ContactField::Message);
        press(&mut form, &mut service, KeyCode::Esc);
        assert!(!form.open);
    }
}
