use crate::game::ClientGame;
use crate::local_player::LocalPlayer;
use crate::reconciler::{LocalItem, RemoteParticipant};
use macroquad::prelude::*;
use shared::HeightField;

/// Pixels per world unit on the map
const MAP_SCALE: f32 = 12.0;
const AVATAR_RADIUS: f32 = 7.0;
const ITEM_RADIUS: f32 = 4.0;

/// Converts a 0xRRGGBB kind color into a macroquad color.
pub fn color_from_hex(hex: u32) -> Color {
    Color::from_rgba(
        ((hex >> 16) & 0xFF) as u8,
        ((hex >> 8) & 0xFF) as u8,
        (hex & 0xFF) as u8,
        255,
    )
}

/// Top-down view centred on the local player.
#[derive(Debug, Clone, Copy)]
pub struct MapView {
    pub center_x: f32,
    pub center_z: f32,
    pub screen_width: f32,
    pub screen_height: f32,
}

impl MapView {
    /// World (x, z) to screen pixels; -z is up.
    pub fn to_screen(&self, x: f32, z: f32) -> (f32, f32) {
        (
            self.screen_width / 2.0 + (x - self.center_x) * MAP_SCALE,
            self.screen_height / 2.0 + (z - self.center_z) * MAP_SCALE,
        )
    }
}

/// Anything drawn as an avatar on the map.
pub trait Renderable {
    fn world_position(&self) -> shared::Vec3;
    fn heading(&self) -> f32;
    fn label(&self) -> &str;
    fn color(&self) -> Color;

    fn draw(&self, view: &MapView) {
        let position = self.world_position();
        let (sx, sy) = view.to_screen(position.x, position.z);
        let (sin, cos) = self.heading().sin_cos();

        draw_circle(sx, sy, AVATAR_RADIUS, self.color());
        draw_circle_lines(sx, sy, AVATAR_RADIUS, 1.5, WHITE);
        draw_line(
            sx,
            sy,
            sx - sin * AVATAR_RADIUS * 1.8,
            sy - cos * AVATAR_RADIUS * 1.8,
            2.0,
            WHITE,
        );
        draw_text(self.label(), sx + AVATAR_RADIUS + 3.0, sy - 4.0, 16.0, WHITE);
    }
}

pub struct LocalAvatar<'a> {
    pub player: &'a LocalPlayer,
    pub name: &'a str,
}

impl Renderable for LocalAvatar<'_> {
    fn world_position(&self) -> shared::Vec3 {
        self.player.position()
    }

    fn heading(&self) -> f32 {
        self.player.yaw()
    }

    fn label(&self) -> &str {
        self.name
    }

    fn color(&self) -> Color {
        GREEN
    }
}

pub struct RemoteAvatar<'a> {
    pub remote: &'a RemoteParticipant,
}

impl Renderable for RemoteAvatar<'_> {
    fn world_position(&self) -> shared::Vec3 {
        self.remote.position
    }

    fn heading(&self) -> f32 {
        self.remote.orientation.y
    }

    fn label(&self) -> &str {
        &self.remote.name
    }

    fn color(&self) -> Color {
        Color::from_rgba(255, 68, 68, 255)
    }
}

#[derive(Default)]
pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Renderer
    }

    pub fn render<H: HeightField>(&mut self, game: &ClientGame<H>) {
        clear_background(Color::from_rgba(34, 51, 34, 255));

        let reconciler = game.reconciler();
        let center = game.player().position();
        let view = MapView {
            center_x: center.x,
            center_z: center.z,
            screen_width: screen_width(),
            screen_height: screen_height(),
        };

        for item in reconciler.items().filter(|item| item.visible) {
            self.draw_item(item, &view, reconciler.is_pending(item.id));
        }

        for remote in reconciler.remotes() {
            RemoteAvatar { remote }.draw(&view);
        }

        if reconciler.is_synced() {
            LocalAvatar {
                player: game.player(),
                name: reconciler.self_name(),
            }
            .draw(&view);
        }

        self.draw_hud(game);
    }

    fn draw_item(&mut self, item: &LocalItem, view: &MapView, pending: bool) {
        let (sx, sy) = view.to_screen(item.position.x, item.position.z);
        draw_circle(sx, sy, ITEM_RADIUS, color_from_hex(item.color));
        if pending {
            draw_circle_lines(sx, sy, ITEM_RADIUS + 2.0, 1.0, YELLOW);
        }
    }

    fn draw_hud<H: HeightField>(&mut self, game: &ClientGame<H>) {
        let reconciler = game.reconciler();
        let mut y = 20.0;

        let connection_color = if game.is_connected() { GREEN } else { RED };
        draw_rectangle(10.0, y - 8.0, 8.0, 8.0, connection_color);

        let status = match (reconciler.disconnect_reason(), reconciler.is_synced()) {
            (Some(reason), _) => format!("Disconnected: {}", reason),
            (None, true) => format!("Score: {}", reconciler.score()),
            (None, false) => "Joining...".to_string(),
        };
        draw_text(&status, 24.0, y, 20.0, WHITE);
        y += 20.0;

        for (kind, count) in reconciler.inventory() {
            draw_text(&format!("{}: {}", kind, count), 24.0, y, 16.0, LIGHTGRAY);
            y += 16.0;
        }

        let others = reconciler.remotes().count();
        draw_text(
            &format!("{} others, {} mushrooms", others, reconciler.visible_item_count()),
            10.0,
            screen_height() - 10.0,
            16.0,
            LIGHTGRAY,
        );

        let leaderboard = reconciler.leaderboard();
        if leaderboard.is_empty() {
            return;
        }

        let x = screen_width() - 200.0;
        let mut y = 20.0;
        draw_text("Leaderboard (L)", x, y, 18.0, WHITE);
        for (rank, entry) in leaderboard.iter().enumerate().take(10) {
            y += 18.0;
            let color = if Some(entry.id) == reconciler.self_id() {
                GREEN
            } else {
                WHITE
            };
            draw_text(
                &format!("{}. {} {}", rank + 1, entry.name, entry.score),
                x,
                y,
                16.0,
                color,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_from_hex() {
        let color = color_from_hex(0xFFD700);
        assert_eq!(color, Color::from_rgba(255, 215, 0, 255));
    }

    #[test]
    fn test_map_view_centres_player() {
        let view = MapView {
            center_x: 10.0,
            center_z: -5.0,
            screen_width: 800.0,
            screen_height: 600.0,
        };

        assert_eq!(view.to_screen(10.0, -5.0), (400.0, 300.0));
        assert_eq!(view.to_screen(11.0, -5.0), (400.0 + MAP_SCALE, 300.0));
        assert_eq!(view.to_screen(10.0, -6.0), (400.0, 300.0 - MAP_SCALE));
    }

    #[test]
    fn test_avatar_variants() {
        let player = LocalPlayer::default();
        let local = LocalAvatar {
            player: &player,
            name: "Ada",
        };
        assert_eq!(local.label(), "Ada");
        assert_eq!(local.world_position(), player.position());

        let remote = RemoteParticipant {
            id: 2,
            name: "Bo".to_string(),
            position: shared::Vec3::new(1.0, 1.6, 2.0),
            orientation: shared::Vec3::new(0.0, 0.7, 0.0),
            target_position: shared::Vec3::new(1.0, 1.6, 2.0),
            target_orientation: shared::Vec3::ZERO,
            score: 0,
        };
        let avatar = RemoteAvatar { remote: &remote };
        assert_eq!(avatar.heading(), 0.7);
        assert_eq!(avatar.label(), "Bo");
        assert_ne!(avatar.color(), local.color());
    }
}
