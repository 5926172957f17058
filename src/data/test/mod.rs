mod broadcast;
mod call;
