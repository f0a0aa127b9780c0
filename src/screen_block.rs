use std::{iter::FusedIterator, num::NonZeroU32};

use crate::geometry::{ScreenBlock, ScreenPoint, ScreenSize};

pub trait ScreenBlockExt {
    fn from_size(size: ScreenSize) -> ScreenBlock;
    fn is_empty(&self) -> bool;
    fn area(&self) -> u32;
    fn contains(&self, point: &ScreenPoint) -> bool;
    fn internal_points(&self) -> InternalPoints;
    fn tile_ordering(&self, tile_size: NonZeroU32) -> Vec<ScreenBlock>;
}

impl ScreenBlockExt for ScreenBlock {
    fn from_size(size: ScreenSize) -> ScreenBlock {
        ScreenBlock::new(ScreenPoint::origin(), ScreenPoint::from(size))
    }

    fn is_empty(&self) -> bool {
        self.min.x >= self.max.x || self.min.y >= self.max.y
    }

    fn area(&self) -> u32 {
        if self.is_empty() {
            0
        } else {
            self.width() * self.height()
        }
    }

    fn contains(&self, point: &ScreenPoint) -> bool {
        self.min.x <= point.x
            && point.x < self.max.x
            && self.min.y <= point.y
            && point.y < self.max.y
    }

    /// Iterator over pixels inside the block, row by row.
    fn internal_points(&self) -> InternalPoints {
        InternalPoints {
            block: *self,
            cursor: self.min,
            remaining: self.area() as usize,
        }
    }

    /// Splits the block into tiles of at most `tile_size` x `tile_size` pixels
    /// (tiles on the right and bottom edge get clipped), ordered by the distance
    /// of their centers from the center of the block.
    fn tile_ordering(&self, tile_size: NonZeroU32) -> Vec<ScreenBlock> {
        if self.is_empty() {
            return Vec::new();
        }

        let tile_size = tile_size.get();
        let mut tiles: Vec<ScreenBlock> = (self.min.y..self.max.y)
            .step_by(tile_size as usize)
            .flat_map(|y| {
                (self.min.x..self.max.x)
                    .step_by(tile_size as usize)
                    .map(move |x| (x, y))
            })
            .map(|(x, y)| {
                ScreenBlock::new(
                    ScreenPoint::new(x, y),
                    ScreenPoint::new(
                        x.saturating_add(tile_size).min(self.max.x),
                        y.saturating_add(tile_size).min(self.max.y),
                    ),
                )
            })
            .collect();

        // Doubled coordinates keep the centers integral
        let doubled_center = |block: &ScreenBlock| {
            (
                block.min.x as i64 + block.max.x as i64,
                block.min.y as i64 + block.max.y as i64,
            )
        };
        let (cx, cy) = doubled_center(self);
        tiles.sort_by_key(|tile| {
            let (x, y) = doubled_center(tile);
            (x - cx).pow(2) + (y - cy).pow(2)
        });

        tiles
    }
}

#[derive(Copy, Clone, Debug)]
pub struct InternalPoints {
    block: ScreenBlock,
    cursor: ScreenPoint,
    remaining: usize,
}

impl Iterator for InternalPoints {
    type Item = ScreenPoint;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let ret = self.cursor;
        self.remaining -= 1;
        self.cursor.x += 1;
        if self.cursor.x >= self.block.max.x {
            self.cursor.x = self.block.min.x;
            self.cursor.y += 1;
        }

        Some(ret)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for InternalPoints {}

impl FusedIterator for InternalPoints {}
