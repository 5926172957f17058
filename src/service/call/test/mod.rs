mod matching;
mod queue;
mod support;
