use std::sync::mpsc::Sender;

use eframe::egui;

use crate::api;
use crate::app_state::{ContactState, Msg};
use crate::models::Config;

/// Render the contact form view. Validation errors show inline next to the
/// actions; the honeypot field stays in the payload but is never rendered.
pub fn render_contact_panel(
    ui: &mut egui::Ui,
    config: &Config,
    contact: &mut ContactState,
    tx: &Sender<Msg>,
) {
    ui.heading("Contact");
    ui.add_space(4.0);
    ui.label("Hiring for a role or contract? Share the brief, timeline, and tech stack.");
    ui.add_space(12.0);

    egui::Grid::new("contact_form")
        .num_columns(2)
        .spacing([12.0, 8.0])
        .show(ui, |ui| {
            ui.label("Name");
            ui.add_sized(
                [320.0, 22.0],
                egui::TextEdit::singleline(&mut contact.form.name),
            );
            ui.end_row();

            ui.label("Email");
            ui.add_sized(
                [320.0, 22.0],
                egui::TextEdit::singleline(&mut contact.form.email),
            );
            ui.end_row();

            ui.label("Message");
            ui.add_sized(
                [320.0, 120.0],
                egui::TextEdit::multiline(&mut contact.form.message),
            );
            ui.end_row();
        });

    ui.add_space(8.0);
    ui.horizontal(|ui| {
        let label = if contact.sending { "Sending…" } else { "Send Message" };
        let clicked = ui
            .add_enabled(!contact.sending, egui::Button::new(label))
            .clicked();
        if contact.done {
            ui.colored_label(egui::Color32::LIGHT_GREEN, "Sent! Check your inbox.");
        }
        if let Some(err) = &contact.error {
            ui.colored_label(egui::Color32::LIGHT_RED, format!("Error: {}", err));
        }

        if clicked {
            contact.done = false;
            match api::validate_contact(&contact.form) {
                Err(message) => contact.error = Some(message),
                Ok(()) => {
                    contact.error = None;
                    contact.sending = true;
                    let tx = tx.clone();
                    let base = config.api_base.clone();
                    let form = contact.form.clone();
                    tokio::spawn(async move {
                        let result = api::send_contact(&base, &form)
                            .await
                            .map_err(|e| e.to_string());
                        let _ = tx.send(Msg::ContactSent(result));
                    });
                }
            }
        }
    });
}
