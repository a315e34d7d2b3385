//! prompt-composer - Prompt composition desktop extension

use prompt_composer::PromptComposerServer;

dxt_common::serve_stdio!(PromptComposerServer, "prompt_composer");
