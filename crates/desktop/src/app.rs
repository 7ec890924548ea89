//! WiserChild Desktop: egui rendering of the sign-on screen, desktop, windows and taskbar.
//!
//! All state lives in `wiser_lib::ui`; this module only draws it and turns egui input into
//! shell events. The relay call runs on a background thread and reports back over an mpsc
//! channel polled once per frame.

use anyhow::Context;
use eframe::egui;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use egui::{Align, Align2, Color32, FontId, Layout, Pos2, Rect, RichText, Sense, Stroke, Vec2};
use wiser_lib::client::RelayClient;
use wiser_lib::config::{self, Config};
use wiser_lib::relay::RelayRequest;
use wiser_lib::ui::chat::CLOSE_WARNING;
use wiser_lib::ui::{
    enter_action, format_time, status_caption, taskbar_clock, DesktopShell, EnterAction, HitTarget,
    Point, SenderKind, SignOnForm, WindowId,
};

const TASKBAR_HEIGHT: f32 = 32.0;
const FRAME_BORDER: f32 = 3.0;
const TITLE_BAR_HEIGHT: f32 = 20.0;
const CLOSE_BUTTON_SIZE: Vec2 = Vec2::new(16.0, 14.0);
const RESIZE_HANDLE_SIZE: f32 = 16.0;
const CLOCK_REFRESH: Duration = Duration::from_secs(1);

const DESKTOP_TEAL: Color32 = Color32::from_rgb(0, 128, 128);
const SILVER: Color32 = Color32::from_rgb(192, 192, 192);
const NAVY: Color32 = Color32::from_rgb(0, 0, 128);
const INACTIVE_TITLE: Color32 = Color32::from_rgb(128, 128, 128);
const SCREEN_NAME_RED: Color32 = Color32::from_rgb(255, 0, 0);
const BUDDY_BLUE: Color32 = Color32::from_rgb(0, 0, 255);
const WARNING_FILL: Color32 = Color32::from_rgb(255, 255, 204);
const WARNING_STROKE: Color32 = Color32::from_rgb(204, 204, 0);

/// Shell changes requested while drawing; applied after every window has been drawn.
enum DesktopAction {
    OpenChat,
    CloseChat,
    SignOff,
    ToggleBuddies,
    Send(RelayRequest),
    PointerDown(WindowId, HitTarget, Point),
}

pub struct WiserApp {
    relay_url: String,
    sign_on: SignOnForm,
    shell: DesktopShell,
    /// Outstanding relay call; at most one at a time.
    reply_receiver: Option<mpsc::Receiver<Result<String, String>>>,
}

impl WiserApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let config = match config::load_config(None) {
            Ok((config, _)) => config,
            Err(e) => {
                log::warn!("failed to load config, using defaults: {:#}", e);
                Config::default()
            }
        };
        let relay_url = config::resolve_relay_url(&config);
        log::info!("desktop started; relay at {}", relay_url);
        Self {
            relay_url,
            sign_on: SignOnForm::new(),
            shell: DesktopShell::new(),
            reply_receiver: None,
        }
    }

    /// Hand the session to the shell once the sign-on animation completes.
    fn poll_sign_on(&mut self, now: Instant) {
        if let Some(session) = self.sign_on.poll(now) {
            self.shell.sign_in(session);
            self.sign_on = SignOnForm::new();
        }
    }

    /// Poll for the relay reply and feed it to the chat view. Call each frame.
    fn poll_relay_reply(&mut self) {
        if let Some(rx) = &self.reply_receiver {
            let result = match rx.try_recv() {
                Ok(result) => result,
                Err(mpsc::TryRecvError::Empty) => return,
                Err(mpsc::TryRecvError::Disconnected) => {
                    Err("relay call ended without a reply".to_string())
                }
            };
            self.reply_receiver = None;
            if let Some(chat) = self.shell.chat_mut() {
                chat.receive_reply(result);
            }
        }
    }

    /// Start the relay call in a background thread.
    fn start_relay_call(&mut self, request: RelayRequest, ctx: &egui::Context) {
        let relay_url = self.relay_url.clone();
        let ctx = ctx.clone();
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let result = run_relay_call(relay_url, request).map_err(|e| {
                log::warn!("relay call failed: {:#}", e);
                e.to_string()
            });
            let _ = tx.send(result);
            ctx.request_repaint();
        });
        self.reply_receiver = Some(rx);
    }

    fn sign_off(&mut self) {
        self.shell.sign_off();
        self.reply_receiver = None;
        self.sign_on = SignOnForm::new();
    }

    fn apply(&mut self, action: DesktopAction, ctx: &egui::Context, now: Instant) {
        match action {
            DesktopAction::OpenChat => self.shell.open_chat(now),
            DesktopAction::CloseChat => {
                if self.shell.request_close_chat() {
                    self.reply_receiver = None;
                }
            }
            DesktopAction::SignOff => self.sign_off(),
            DesktopAction::ToggleBuddies => {
                if let Some(list) = self.shell.buddy_list_mut() {
                    list.toggle_buddies();
                }
            }
            DesktopAction::Send(request) => self.start_relay_call(request, ctx),
            DesktopAction::PointerDown(id, target, pointer) => {
                self.shell.pointer_down(id, target, pointer)
            }
        }
    }

    /// Ask for a repaint when the next timer (sign-on tick, greeting, clock) is due.
    fn schedule_repaint(&self, ctx: &egui::Context, now: Instant) {
        let mut next: Option<Duration> = None;
        let mut consider = |d: Duration| {
            next = Some(next.map_or(d, |n| n.min(d)));
        };
        if let Some(progress) = self.sign_on.progress() {
            consider(progress.until_next_tick(now));
        }
        if self.shell.is_signed_in() {
            consider(CLOCK_REFRESH);
        }
        if let Some(deadline) = self.shell.chat().and_then(|c| c.next_deadline()) {
            consider(deadline.saturating_duration_since(now));
        }
        if let Some(d) = next {
            ctx.request_repaint_after(d);
        }
    }

    fn ui_sign_on(&mut self, ctx: &egui::Context, now: Instant) {
        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(DESKTOP_TEAL))
            .show(ctx, |_ui| {});

        egui::Window::new("Sign On")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, Vec2::ZERO)
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.add_space(8.0);
                    ui.heading(RichText::new("AIM").strong().color(NAVY));
                    ui.label(RichText::new("Instant Messenger").small());
                    ui.add_space(8.0);
                });

                let editable = !self.sign_on.is_signing_on();
                ui.label("Screen Name");
                ui.add_enabled(
                    editable,
                    egui::TextEdit::singleline(&mut self.sign_on.screen_name)
                        .desired_width(f32::INFINITY),
                );
                ui.label("Password (Anthropic API Key)");
                let password = ui.add_enabled(
                    editable,
                    egui::TextEdit::singleline(&mut self.sign_on.password)
                        .password(true)
                        .desired_width(f32::INFINITY),
                );
                let enter = password.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

                if let Some(err) = self.sign_on.error() {
                    ui.colored_label(Color32::RED, err.to_string());
                }
                if let Some(progress) = self.sign_on.progress() {
                    let percent = progress.percent(now);
                    ui.add(
                        egui::ProgressBar::new(f32::from(percent) / 100.0)
                            .text(status_caption(percent)),
                    );
                }

                ui.add_space(8.0);
                ui.vertical_centered(|ui| {
                    let clicked = ui
                        .add_enabled(editable, egui::Button::new("Sign On"))
                        .clicked();
                    if clicked || enter {
                        if let Err(e) = self.sign_on.submit(now) {
                            log::debug!("sign-on rejected: {}", e);
                        }
                    }
                });
            });
    }

    fn ui_taskbar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("taskbar")
            .exact_height(TASKBAR_HEIGHT)
            .frame(
                egui::Frame::none()
                    .fill(SILVER)
                    .inner_margin(egui::Margin::symmetric(4.0, 3.0)),
            )
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    if ui.button(RichText::new("Start").strong()).clicked() {
                        self.shell.bring_to_front(WindowId::BuddyList);
                    }
                    ui.separator();
                    let topmost = self.shell.topmost();
                    for id in [WindowId::BuddyList, WindowId::Chat] {
                        if !self.shell.is_open(id) {
                            continue;
                        }
                        if ui
                            .selectable_label(topmost == Some(id), id.taskbar_label())
                            .clicked()
                        {
                            self.shell.bring_to_front(id);
                        }
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(taskbar_clock());
                    });
                });
            });
    }

    /// Draw one window (frame, title bar, body) and report what happened to it.
    fn ui_window(
        &mut self,
        ctx: &egui::Context,
        id: WindowId,
        origin: Pos2,
        actions: &mut Vec<DesktopAction>,
    ) {
        let Some(state) = self.shell.window(id) else {
            return;
        };
        let (position, size, resizable) = (state.position(), state.size(), state.resizable());
        let active = self.shell.topmost() == Some(id);
        let title = match id {
            WindowId::BuddyList => format!(
                "{}'s Buddy List",
                self.shell.session().map_or("", |s| s.screen_name.as_str())
            ),
            WindowId::Chat => self.shell.chat().map(|c| c.title()).unwrap_or_default(),
        };

        let frame_rect = Rect::from_min_size(
            origin + Vec2::new(position.x, position.y),
            Vec2::new(size.width, size.height),
        );
        let title_rect = Rect::from_min_size(
            frame_rect.min + Vec2::splat(FRAME_BORDER),
            Vec2::new(frame_rect.width() - 2.0 * FRAME_BORDER, TITLE_BAR_HEIGHT),
        );
        let close_rect = id.closable().then(|| {
            Rect::from_center_size(
                Pos2::new(
                    title_rect.right() - 3.0 - CLOSE_BUTTON_SIZE.x / 2.0,
                    title_rect.center().y,
                ),
                CLOSE_BUTTON_SIZE,
            )
        });
        let resize_rect = resizable.then(|| {
            Rect::from_min_max(
                frame_rect.max - Vec2::splat(RESIZE_HANDLE_SIZE),
                frame_rect.max,
            )
        });
        let body_rect = Rect::from_min_max(
            Pos2::new(frame_rect.left() + FRAME_BORDER, title_rect.bottom() + 2.0),
            frame_rect.max - Vec2::splat(FRAME_BORDER),
        );

        let area = egui::Area::new(egui::Id::new(("window", id)))
            .fixed_pos(frame_rect.min)
            .order(egui::Order::Middle)
            .show(ctx, |ui| {
                let pressed_at = ui
                    .input(|i| i.pointer.primary_pressed().then(|| i.pointer.interact_pos()))
                    .flatten()
                    .filter(|_| ui.rect_contains_pointer(frame_rect));
                if let Some(p) = pressed_at {
                    let target = hit_target(p, close_rect, resize_rect, title_rect);
                    actions.push(DesktopAction::PointerDown(id, target, to_point(p, origin)));
                }

                let painter = ui.painter().clone();
                painter.rect_filled(frame_rect, 0.0, SILVER);
                painter.rect_stroke(frame_rect, 0.0, Stroke::new(1.0, Color32::BLACK));
                painter.rect_filled(title_rect, 0.0, if active { NAVY } else { INACTIVE_TITLE });
                painter.text(
                    title_rect.left_center() + Vec2::new(4.0, 0.0),
                    Align2::LEFT_CENTER,
                    &title,
                    FontId::proportional(12.0),
                    Color32::WHITE,
                );
                if let Some(rect) = close_rect {
                    if ui.put(rect, egui::Button::new("✕").small()).clicked() {
                        actions.push(DesktopAction::CloseChat);
                    }
                }

                let mut body = ui.child_ui(body_rect, Layout::top_down(Align::Min));
                body.set_clip_rect(body_rect);
                match id {
                    WindowId::BuddyList => self.ui_buddy_list(&mut body, actions),
                    WindowId::Chat => self.ui_chat(&mut body, actions),
                }

                if let Some(rect) = resize_rect {
                    for k in 1..=3 {
                        let inset = 4.0 * k as f32;
                        painter.line_segment(
                            [
                                Pos2::new(rect.right() - inset, rect.bottom() - 2.0),
                                Pos2::new(rect.right() - 2.0, rect.bottom() - inset),
                            ],
                            Stroke::new(1.0, Color32::DARK_GRAY),
                        );
                    }
                }
                ui.allocate_rect(frame_rect, Sense::hover());
            });
        ctx.move_to_top(area.response.layer_id);
    }

    fn ui_buddy_list(&mut self, ui: &mut egui::Ui, actions: &mut Vec<DesktopAction>) {
        let Some(list) = self.shell.buddy_list() else {
            return;
        };
        ui.with_layout(Layout::bottom_up(Align::Min), |ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new("● Online").small().color(Color32::DARK_GREEN));
                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    if ui.small_button("Sign Off").clicked() {
                        actions.push(DesktopAction::SignOff);
                    }
                });
            });
            ui.with_layout(Layout::top_down(Align::Min), |ui| {
                egui::Frame::none()
                    .fill(Color32::WHITE)
                    .inner_margin(egui::Margin::same(4.0))
                    .show(ui, |ui| {
                        ui.set_min_size(ui.available_size());
                        ui.label(RichText::new("Online").strong());
                        let arrow = if list.buddies_expanded() { "▼" } else { "▶" };
                        let group = ui.add(
                            egui::Label::new(RichText::new(format!("{} Buddies (1/1)", arrow)))
                                .sense(Sense::click()),
                        );
                        if group.clicked() {
                            actions.push(DesktopAction::ToggleBuddies);
                        }
                        if list.buddies_expanded() {
                            for (name, tagline) in list.buddies() {
                                ui.indent("buddy", |ui| {
                                    let row = ui.add(
                                        egui::Label::new(RichText::new(*name).strong())
                                            .sense(Sense::click()),
                                    );
                                    ui.label(RichText::new(*tagline).italics().small());
                                    if row.double_clicked() {
                                        actions.push(DesktopAction::OpenChat);
                                    }
                                });
                            }
                        }
                        ui.add_space(8.0);
                        ui.label(RichText::new("Offline").strong());
                        ui.label(RichText::new("No offline buddies").italics().small());
                    });
            });
        });
    }

    fn ui_chat(&mut self, ui: &mut egui::Ui, actions: &mut Vec<DesktopAction>) {
        let Some(chat) = self.shell.chat_mut() else {
            return;
        };
        let input_id = egui::Id::new("chat_input");
        ui.with_layout(Layout::bottom_up(Align::Min), |ui| {
            let mut send = false;
            ui.horizontal(|ui| {
                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    send = ui
                        .add_enabled(chat.can_send(), egui::Button::new("Send"))
                        .clicked();
                });
            });

            // Plain Enter sends; Shift+Enter reaches the text edit as a newline.
            let focused = ui.ctx().memory(|m| m.has_focus(input_id));
            if focused
                && ui.ctx().input_mut(|i| {
                    let mods = i.modifiers;
                    i.key_pressed(egui::Key::Enter)
                        && enter_action(mods.shift) == EnterAction::Submit
                        && i.consume_key(mods, egui::Key::Enter)
                })
            {
                send = true;
            }
            let input = ui.add(
                egui::TextEdit::multiline(&mut chat.input)
                    .id(input_id)
                    .desired_rows(3)
                    .desired_width(f32::INFINITY)
                    .hint_text("Type your message..."),
            );
            if input.changed() {
                chat.on_input_changed();
            }
            if send {
                if let Some(request) = chat.submit() {
                    actions.push(DesktopAction::Send(request));
                }
                input.request_focus();
            }

            ui.label(RichText::new(chat.last_message_label()).small().color(Color32::DARK_GRAY));

            ui.with_layout(Layout::top_down(Align::Min), |ui| {
                ui.horizontal(|ui| {
                    ui.label(RichText::new(chat.buddy()).strong());
                    ui.label(
                        RichText::new(format!("- {}", wiser_lib::relay::BOT_TAGLINE))
                            .small()
                            .color(Color32::GRAY),
                    );
                });
                egui::Frame::none()
                    .fill(Color32::WHITE)
                    .inner_margin(egui::Margin::same(4.0))
                    .show(ui, |ui| {
                        egui::ScrollArea::vertical()
                            .id_source("transcript")
                            .auto_shrink([false, false])
                            .stick_to_bottom(true)
                            .show(ui, |ui| {
                                for m in chat.messages() {
                                    let color = match chat.sender_kind(m) {
                                        SenderKind::Me => SCREEN_NAME_RED,
                                        SenderKind::Buddy => BUDDY_BLUE,
                                    };
                                    ui.horizontal_wrapped(|ui| {
                                        ui.spacing_mut().item_spacing.x = 0.0;
                                        ui.label(RichText::new(&m.sender).strong().color(color));
                                        ui.label(
                                            RichText::new(format!(
                                                " ({})",
                                                format_time(&m.timestamp)
                                            ))
                                            .small()
                                            .color(Color32::GRAY),
                                        );
                                        ui.label(": ");
                                        ui.label(&m.text);
                                    });
                                    ui.add_space(4.0);
                                }
                                if chat.typing_visible() {
                                    ui.label(
                                        RichText::new(format!("{} is typing...", chat.buddy()))
                                            .italics()
                                            .color(Color32::GRAY),
                                    );
                                }
                                if chat.close_armed() {
                                    egui::Frame::none()
                                        .fill(WARNING_FILL)
                                        .stroke(Stroke::new(1.0, WARNING_STROKE))
                                        .inner_margin(egui::Margin::same(6.0))
                                        .show(ui, |ui| {
                                            ui.label(RichText::new(CLOSE_WARNING).italics().small());
                                        });
                                }
                            });
                    });
            });
        });
    }

    fn ui_desktop(&mut self, ctx: &egui::Context, now: Instant) {
        self.ui_taskbar(ctx);
        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(DESKTOP_TEAL))
            .show(ctx, |_ui| {});
        let origin = ctx.available_rect().min;

        let mut actions = Vec::new();
        for id in self.shell.focus_order().to_vec() {
            self.ui_window(ctx, id, origin, &mut actions);
        }
        for action in actions {
            self.apply(action, ctx, now);
        }

        let (released, down, pointer) = ctx.input(|i| {
            (
                i.pointer.primary_released(),
                i.pointer.primary_down(),
                i.pointer.interact_pos(),
            )
        });
        if let Some(p) = pointer {
            self.shell.pointer_moved(to_point(p, origin));
        }
        if released || !down {
            self.shell.pointer_released();
        }
    }
}

impl eframe::App for WiserApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.poll_sign_on(now);
        self.poll_relay_reply();
        if let Some(chat) = self.shell.chat_mut() {
            chat.tick(now);
        }

        if self.shell.is_signed_in() {
            self.ui_desktop(ctx, now);
        } else {
            self.ui_sign_on(ctx, now);
        }
        self.schedule_repaint(ctx, now);
    }
}

/// Which part of a window frame a press landed on. Buttons win over the resize corner.
fn hit_target(p: Pos2, close: Option<Rect>, resize: Option<Rect>, title: Rect) -> HitTarget {
    if close.is_some_and(|r| r.contains(p)) {
        HitTarget::Button
    } else if resize.is_some_and(|r| r.contains(p)) {
        HitTarget::ResizeHandle
    } else if title.contains(p) {
        HitTarget::TitleBar
    } else {
        HitTarget::Body
    }
}

fn to_point(p: Pos2, origin: Pos2) -> Point {
    Point::new(p.x - origin.x, p.y - origin.y)
}

/// One relay call on a private runtime; the error is the reason shown in the transcript.
/// The top-level message of the error is the reason shown in the transcript, so relay failures
/// propagate without added context.
fn run_relay_call(relay_url: String, request: RelayRequest) -> anyhow::Result<String> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building relay runtime")?;
    let reply = rt.block_on(async move {
        let client = RelayClient::new(relay_url);
        client.chat(&request).await
    })?;
    Ok(reply)
}
