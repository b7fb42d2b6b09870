use roster_config::RatingColor;

/// Ordered rating buckets. Every rating maps to exactly one color.
#[derive(Clone, Debug)]
pub struct RatingPalette {
	buckets: Vec<Bucket>,
	fallback: String,
}
impl RatingPalette {
	pub fn from_config(colors: &[RatingColor]) -> Self {
		let colors =
			if colors.is_empty() { RatingColor::default_palette() } else { colors.to_vec() };
		let mut buckets = Vec::with_capacity(colors.len());
		let mut fallback = None;

		for color in colors {
			match color.limit {
				Some(limit) => buckets.push(Bucket { limit, color: color.color }),
				None => fallback = Some(color.color),
			}
		}

		// A palette without an open-ended bucket reuses its highest color above the last limit.
		let fallback = fallback
			.or_else(|| buckets.last().map(|bucket| bucket.color.clone()))
			.unwrap_or_default();

		Self { buckets, fallback }
	}

	pub fn color_for(&self, rating: i64) -> &str {
		self.buckets
			.iter()
			.find(|bucket| rating < i64::from(bucket.limit))
			.map(|bucket| bucket.color.as_str())
			.unwrap_or(self.fallback.as_str())
	}
}
impl Default for RatingPalette {
	fn default() -> Self {
		Self::from_config(&RatingColor::default_palette())
	}
}

#[derive(Clone, Debug)]
struct Bucket {
	limit: u32,
	color: String,
}

#[cfg(test)]
mod tests {
	use crate::rating::RatingPalette;

	#[test]
	fn default_palette_buckets() {
		let palette = RatingPalette::default();

		assert_eq!(palette.color_for(-5), "#9D9FA0");
		assert_eq!(palette.color_for(899), "#9D9FA0");
		assert_eq!(palette.color_for(900), "#69C329");
		assert_eq!(palette.color_for(1_499), "#616BD5");
		assert_eq!(palette.color_for(2_199), "#FCD617");
		assert_eq!(palette.color_for(2_200), "#EF3A3A");
		assert_eq!(palette.color_for(i64::MAX), "#EF3A3A");
	}
}
