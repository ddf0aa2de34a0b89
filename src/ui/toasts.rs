use egui::{Align2, Context, RichText};
use egui_phosphor::regular as icons;

use crate::ui::theme;

/// Seconds a toast stays on screen.
pub const TOAST_LIFETIME: f64 = 4.0;

#[derive(Debug, Clone, PartialEq)]
struct Toast {
    text: String,
    error: bool,
    shown_at: f64,
}

/// Transient notifications stacked in the bottom-right corner.
#[derive(Debug, Default)]
pub struct Toasts {
    items: Vec<Toast>,
}

impl Toasts {
    pub fn push(&mut self, text: impl Into<String>, error: bool, now: f64) {
        self.items.push(Toast {
            text: text.into(),
            error,
            shown_at: now,
        });
    }

    /// Drop toasts older than [`TOAST_LIFETIME`].
    pub fn expire(&mut self, now: f64) {
        self.items.retain(|t| now - t.shown_at < TOAST_LIFETIME);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn show(&mut self, ctx: &Context) {
        let now = ctx.input(|i| i.time);
        self.expire(now);
        if self.items.is_empty() {
            return;
        }

        egui::Area::new(egui::Id::new("toasts"))
            .anchor(Align2::RIGHT_BOTTOM, [-12.0, -(theme::STATUS_BAR_HEIGHT + 12.0)])
            .order(egui::Order::Foreground)
            .interactable(false)
            .show(ctx, |ui| {
                for toast in &self.items {
                    let (icon, color) = if toast.error {
                        (icons::WARNING_CIRCLE, theme::DANGER)
                    } else {
                        (icons::CHECK_CIRCLE, theme::SUCCESS)
                    };
                    egui::Frame::popup(ui.style())
                        .stroke(egui::Stroke::new(1.0, color))
                        .show(ui, |ui| {
                            ui.set_max_width(320.0);
                            ui.label(RichText::new(format!("{icon}  {}", toast.text)).color(color));
                        });
                    ui.add_space(4.0);
                }
            });

        // Wake up again to remove the oldest one on time.
        if let Some(oldest) = self.items.iter().map(|t| t.shown_at).reduce(f64::min) {
            let remaining = (oldest + TOAST_LIFETIME - now).max(0.0);
            ctx.request_repaint_after(std::time::Duration::from_secs_f64(remaining));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toasts_expire_after_lifetime() {
        let mut toasts = Toasts::default();
        toasts.push("Project 'Alpha' created", false, 10.0);
        toasts.push("delete of 'Beta' failed", true, 12.0);

        toasts.expire(13.9);
        assert_eq!(toasts.len(), 2);

        toasts.expire(14.0);
        assert_eq!(toasts.len(), 1);

        toasts.expire(16.5);
        assert!(toasts.is_empty());
    }
}
