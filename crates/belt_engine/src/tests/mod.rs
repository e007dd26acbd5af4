//! Cross-module tests of the edit, cull and draw pipeline

mod edit_render_pipeline;
