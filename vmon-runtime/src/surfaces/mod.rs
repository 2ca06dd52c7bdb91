mod log_surface;
mod svg;

pub use log_surface::LogSurface;
pub use svg::SvgSurface;

const PALETTE: [(u8, u8, u8); 3] = [(86, 156, 214), (220, 122, 95), (181, 206, 168)];

fn palette_color(idx: usize) -> (u8, u8, u8) {
    PALETTE[idx % PALETTE.len()]
}
