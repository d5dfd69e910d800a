/// Primitive topology for non-indexed draws.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PrimitiveTopology {
    PointList,
    LineList,
    LineStrip,
    TriangleList,
    TriangleStrip,
}

impl PrimitiveTopology {
    /// Number of vertices consumed by `primitive_count` primitives.
    ///
    /// Strips share vertices between neighbours, so a strip of `n` triangles reads
    /// `n + 2` vertices. Zero primitives read zero vertices for every topology.
    pub fn vertex_count(self, primitive_count: u32) -> u32 {
        if primitive_count == 0 {
            return 0;
        }
        match self {
            Self::PointList => primitive_count,
            Self::LineList => primitive_count.saturating_mul(2),
            Self::LineStrip => primitive_count.saturating_add(1),
            Self::TriangleList => primitive_count.saturating_mul(3),
            Self::TriangleStrip => primitive_count.saturating_add(2),
        }
    }

    pub fn to_wgpu(self) -> wgpu::PrimitiveTopology {
        match self {
            Self::PointList => wgpu::PrimitiveTopology::PointList,
            Self::LineList => wgpu::PrimitiveTopology::LineList,
            Self::LineStrip => wgpu::PrimitiveTopology::LineStrip,
            Self::TriangleList => wgpu::PrimitiveTopology::TriangleList,
            Self::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_strip_triangle_reads_three_vertices() {
        assert_eq!(PrimitiveTopology::TriangleStrip.vertex_count(1), 3);
        assert_eq!(PrimitiveTopology::TriangleStrip.vertex_count(4), 6);
    }

    #[test]
    fn lists_do_not_share_vertices() {
        assert_eq!(PrimitiveTopology::TriangleList.vertex_count(2), 6);
        assert_eq!(PrimitiveTopology::LineList.vertex_count(3), 6);
        assert_eq!(PrimitiveTopology::PointList.vertex_count(5), 5);
    }

    #[test]
    fn line_strip_adds_one() {
        assert_eq!(PrimitiveTopology::LineStrip.vertex_count(2), 3);
    }

    #[test]
    fn zero_primitives_read_nothing() {
        for t in [
            PrimitiveTopology::PointList,
            PrimitiveTopology::LineList,
            PrimitiveTopology::LineStrip,
            PrimitiveTopology::TriangleList,
            PrimitiveTopology::TriangleStrip,
        ] {
            assert_eq!(t.vertex_count(0), 0);
        }
    }
}
