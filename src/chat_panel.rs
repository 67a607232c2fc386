use std::sync::mpsc::Sender;

use eframe::egui;

use crate::api;
use crate::app_state::{ChatState, Msg};
use crate::models::{ChatMessage, ChatRole, Config};

/// Render the assistant chat widget (toggleable side panel).
pub fn render_chat_panel(
    ui: &mut egui::Ui,
    config: &Config,
    chat: &mut ChatState,
    tx: &Sender<Msg>,
) {
    ui.heading("Ask me anything");
    ui.add_space(4.0);
    ui.label(
        egui::RichText::new("Questions about the projects, the stack, availability…")
            .small()
            .color(egui::Color32::GRAY),
    );
    ui.separator();

    let history_height = ui.available_height() - 64.0;
    egui::ScrollArea::vertical()
        .max_height(history_height.max(80.0))
        .stick_to_bottom(true)
        .show(ui, |ui| {
            if chat.messages.is_empty() {
                ui.colored_label(egui::Color32::GRAY, "No messages yet.");
            }
            for msg in &chat.messages {
                match msg.role {
                    ChatRole::User => {
                        ui.label(
                            egui::RichText::new(format!("You: {}", msg.text)).strong(),
                        );
                    }
                    ChatRole::Assistant => {
                        ui.label(&msg.text);
                    }
                }
                ui.add_space(4.0);
            }
            if chat.busy {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.colored_label(egui::Color32::GRAY, "Thinking…");
                });
            }
        });

    ui.separator();
    let mut send_now = false;
    ui.horizontal(|ui| {
        let edit = ui.add_sized(
            [ui.available_width() - 56.0, 22.0],
            egui::TextEdit::singleline(&mut chat.input).hint_text("Type a question"),
        );
        if edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            send_now = true;
        }
        if ui.add_enabled(!chat.busy, egui::Button::new("Send")).clicked() {
            send_now = true;
        }
    });

    if send_now && !chat.busy {
        let text = chat.input.trim().to_string();
        if !text.is_empty() {
            chat.messages.push(ChatMessage {
                role: ChatRole::User,
                text: text.clone(),
            });
            chat.input.clear();
            chat.busy = true;

            let tx = tx.clone();
            let base = config.api_base.clone();
            let context = config.chat_context.clone();
            tokio::spawn(async move {
                let reply = api::ask_assistant_safe(&base, &text, &context).await;
                let _ = tx.send(Msg::AssistantReplied(reply));
            });
        }
    }
}
