mod draw;
mod game;
mod neuro;

use anyhow::{Context, Result};
use pixels::{Pixels, SurfaceTexture};
use std::time::{Duration, Instant};
use winit::dpi::LogicalSize;
use winit::event::{Event, VirtualKeyCode};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;
use winit_input_helper::WinitInputHelper;

use game::World;
use neuro::EvoConfig;

const WIDTH: u32 = game::FIELD_W as u32;
const HEIGHT: u32 = game::FIELD_H as u32;
const TICK: Duration = Duration::from_micros(16_667); // ~60 Hz, best effort

const BACKGROUND: draw::Color = (15, 25, 40, 255);
const PIPE_FILL: draw::Color = (60, 180, 75, 255);
const PIPE_RIM: draw::Color = (30, 110, 45, 255);
const BIRD_FILL: draw::Color = (240, 200, 60, 90);
const HUD_TEXT: draw::Color = (124, 115, 46, 255);

fn main() -> Result<()> {
    let event_loop = EventLoop::new();
    let mut input = WinitInputHelper::new();

    let window = WindowBuilder::new()
        .with_title("Flappy Bird GA")
        .with_inner_size(LogicalSize::new(WIDTH, HEIGHT))
        .with_resizable(false)
        .build(&event_loop)
        .context("failed to create window")?;

    let mut pixels = {
        let window_size = window.inner_size();
        let surface_texture = SurfaceTexture::new(window_size.width, window_size.height, &window);
        Pixels::new(WIDTH, HEIGHT, surface_texture).context("failed to create pixel surface")?
    };

    let mut world = World::new(EvoConfig::default(), rand::random::<u64>());
    let mut last_tick = Instant::now();

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        if let Event::RedrawRequested(_) = event {
            render(pixels.frame_mut(), &world);
            if pixels.render().is_err() {
                *control_flow = ControlFlow::Exit;
            }
        }

        if input.update(&event) {
            if input.key_pressed(VirtualKeyCode::Escape)
                || input.close_requested()
                || input.destroyed()
            {
                *control_flow = ControlFlow::Exit;
                return;
            }

            if last_tick.elapsed() >= TICK {
                world.update();
                last_tick = Instant::now();
            }
            window.request_redraw();
        }
    })
}

fn render(frame: &mut [u8], world: &World) {
    draw::clear(frame, BACKGROUND);

    for pipe in &world.pipes {
        let (x, y) = (pipe.x as i32, pipe.y as i32);
        let (w, h) = (pipe.width as i32, pipe.height as i32);
        draw::fill_rect(frame, WIDTH, HEIGHT, x, y, w, h, PIPE_FILL);
        draw::stroke_rect(frame, WIDTH, HEIGHT, x, y, w, h, PIPE_RIM);
    }

    // many birds overlap at the same x, so each is drawn translucent
    for bird in world.birds.iter().filter(|b| b.alive) {
        draw::fill_rect(
            frame,
            WIDTH,
            HEIGHT,
            bird.x as i32,
            bird.y as i32,
            bird.width as i32,
            bird.height as i32,
            BIRD_FILL,
        );
    }

    let lines = [
        format!("GENERATION: {}", world.generation),
        format!("MAX SCORE: {}", world.max_score),
        format!("SCORE: {}", world.score),
        format!("ALIVE: {}/{}", world.alive_count, world.population_size()),
    ];
    for (i, line) in lines.iter().enumerate() {
        let x = WIDTH as i32 / 2 - draw::text_width(line, 2) / 2;
        let y = 8 + i as i32 * 18;
        draw::draw_text(frame, WIDTH, HEIGHT, line, x, y, 2, HUD_TEXT);
    }

    draw::draw_chart(
        frame,
        WIDTH,
        HEIGHT,
        8,
        HEIGHT as i32 - 68,
        160,
        60,
        &world.best_history,
    );
}
